//! Membership repository.
//!
//! Enforces the uniqueness constraint on `(identity_id, tenant_id)` and
//! implements idempotent provisioning with a retry-on-conflict loop, the way
//! a database-backed store would resolve two racing first-time selections —
//! no application-level locking around the whole operation.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use praxis_auth::{Membership, OverrideEffect, Permission, PermissionCatalog, Role};
use praxis_core::{DomainError, DomainResult, IdentityId, MembershipId, TenantId};

const ENSURE_RETRIES: usize = 3;

#[derive(Debug, Default)]
struct MembershipMap {
    by_id: HashMap<MembershipId, Membership>,
    by_pair: HashMap<(IdentityId, TenantId), MembershipId>,
}

#[derive(Debug, Default)]
pub struct MembershipStore {
    inner: RwLock<MembershipMap>,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: MembershipId) -> DomainResult<Membership> {
        self.inner
            .read()
            .expect("membership store poisoned")
            .by_id
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    pub fn find(&self, identity_id: IdentityId, tenant_id: TenantId) -> Option<Membership> {
        let map = self.inner.read().expect("membership store poisoned");
        map.by_pair
            .get(&(identity_id, tenant_id))
            .and_then(|id| map.by_id.get(id))
            .cloned()
    }

    /// The live membership backing a tenant claim; fails closed when the
    /// membership is missing or deactivated.
    pub fn find_active(&self, identity_id: IdentityId, tenant_id: TenantId) -> DomainResult<Membership> {
        match self.find(identity_id, tenant_id) {
            Some(m) if m.is_active => Ok(m),
            _ => Err(DomainError::authorization("no active membership for tenant")),
        }
    }

    pub fn list_for_identity(&self, identity_id: IdentityId) -> Vec<Membership> {
        let map = self.inner.read().expect("membership store poisoned");
        map.by_id
            .values()
            .filter(|m| m.identity_id == identity_id)
            .cloned()
            .collect()
    }

    /// Idempotent upsert: active memberships are returned unchanged, inactive
    /// ones reactivated, absent ones created with a single primary assignment
    /// to `default_role`.
    pub fn ensure(
        &self,
        identity_id: IdentityId,
        tenant_id: TenantId,
        default_role: &Role,
    ) -> DomainResult<Membership> {
        for _ in 0..ENSURE_RETRIES {
            if let Some(existing) = self.find(identity_id, tenant_id) {
                if existing.is_active {
                    return Ok(existing);
                }
                return self.reactivate(existing.id);
            }

            match self.try_insert(identity_id, tenant_id, default_role) {
                Ok(membership) => return Ok(membership),
                // Lost the race to a concurrent insert; loop back and load
                // the winner instead of failing.
                Err(DomainError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(DomainError::conflict("concurrent membership creation"))
    }

    fn try_insert(
        &self,
        identity_id: IdentityId,
        tenant_id: TenantId,
        default_role: &Role,
    ) -> DomainResult<Membership> {
        let mut map = self.inner.write().expect("membership store poisoned");
        if map.by_pair.contains_key(&(identity_id, tenant_id)) {
            return Err(DomainError::conflict("membership already exists"));
        }

        let membership = Membership::new(identity_id, tenant_id, default_role.id, None, Utc::now());
        map.by_pair.insert((identity_id, tenant_id), membership.id);
        map.by_id.insert(membership.id, membership.clone());
        tracing::debug!(
            identity = %identity_id,
            tenant = %tenant_id,
            role = %default_role.name,
            "auto-provisioned membership"
        );
        Ok(membership)
    }

    fn reactivate(&self, id: MembershipId) -> DomainResult<Membership> {
        let mut map = self.inner.write().expect("membership store poisoned");
        let membership = map.by_id.get_mut(&id).ok_or(DomainError::NotFound)?;
        membership.reactivate();
        Ok(membership.clone())
    }

    /// Assign `role` to a membership.
    ///
    /// The role must be visible to the membership's tenant (system role or a
    /// custom role owned by it). With `make_primary`, demotion of the old
    /// primary and promotion of the new happen in a single update.
    pub fn assign_role(
        &self,
        id: MembershipId,
        role: &Role,
        assigned_by: IdentityId,
        make_primary: bool,
    ) -> DomainResult<Membership> {
        let mut map = self.inner.write().expect("membership store poisoned");
        let membership = map.by_id.get_mut(&id).ok_or(DomainError::NotFound)?;
        if !role.visible_to(membership.tenant_id) {
            return Err(DomainError::validation("role is not visible to this tenant"));
        }

        membership.assign_role(role.id, Some(assigned_by), make_primary, Utc::now());
        debug_assert!(membership.has_exactly_one_primary());
        Ok(membership.clone())
    }

    /// Set a per-permission override, replacing any previous override for the
    /// same name. Unknown permission names are rejected.
    pub fn set_override(
        &self,
        id: MembershipId,
        permission: Permission,
        effect: OverrideEffect,
        catalog: &PermissionCatalog,
    ) -> DomainResult<Membership> {
        if !catalog.contains(permission.as_str()) {
            return Err(DomainError::validation(format!(
                "unknown permission '{permission}'"
            )));
        }

        let mut map = self.inner.write().expect("membership store poisoned");
        let membership = map.by_id.get_mut(&id).ok_or(DomainError::NotFound)?;
        membership.set_override(permission, effect);
        Ok(membership.clone())
    }

    /// Revoke access: the membership is deactivated, its role and override
    /// history preserved for audit.
    pub fn deactivate(&self, id: MembershipId) -> DomainResult<()> {
        let mut map = self.inner.write().expect("membership store poisoned");
        let membership = map.by_id.get_mut(&id).ok_or(DomainError::NotFound)?;
        membership.deactivate();
        Ok(())
    }

    /// Total number of membership rows for a pair (test support: provisioning
    /// must never duplicate).
    pub fn count_for_pair(&self, identity_id: IdentityId, tenant_id: TenantId) -> usize {
        let map = self.inner.read().expect("membership store poisoned");
        map.by_id
            .values()
            .filter(|m| m.identity_id == identity_id && m.tenant_id == tenant_id)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_auth::{system_roles, DEFAULT_ROLE};

    fn staff_role() -> Role {
        let catalog = PermissionCatalog::seeded();
        system_roles(&catalog)
            .into_iter()
            .find(|r| r.name == DEFAULT_ROLE)
            .unwrap()
    }

    #[test]
    fn ensure_is_idempotent() {
        let store = MembershipStore::new();
        let identity = IdentityId::new();
        let tenant = TenantId::new();
        let staff = staff_role();

        let first = store.ensure(identity, tenant, &staff).unwrap();
        let second = store.ensure(identity, tenant, &staff).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count_for_pair(identity, tenant), 1);
    }

    #[test]
    fn ensure_reactivates_instead_of_duplicating() {
        let store = MembershipStore::new();
        let identity = IdentityId::new();
        let tenant = TenantId::new();
        let staff = staff_role();

        let first = store.ensure(identity, tenant, &staff).unwrap();
        store.deactivate(first.id).unwrap();
        assert!(store.find_active(identity, tenant).is_err());

        let revived = store.ensure(identity, tenant, &staff).unwrap();
        assert_eq!(revived.id, first.id);
        assert!(revived.is_active);
        assert_eq!(store.count_for_pair(identity, tenant), 1);
    }

    #[test]
    fn concurrent_ensure_produces_one_row() {
        use std::sync::Arc;

        let store = Arc::new(MembershipStore::new());
        let identity = IdentityId::new();
        let tenant = TenantId::new();
        let staff = Arc::new(staff_role());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let staff = Arc::clone(&staff);
                std::thread::spawn(move || store.ensure(identity, tenant, &staff).map(|m| m.id))
            })
            .collect();

        let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.count_for_pair(identity, tenant), 1);
    }

    #[test]
    fn custom_role_from_other_tenant_not_assignable() {
        let store = MembershipStore::new();
        let identity = IdentityId::new();
        let tenant = TenantId::new();
        let staff = staff_role();
        let membership = store.ensure(identity, tenant, &staff).unwrap();

        let foreign = Role::custom(TenantId::new(), "triage", vec![]);
        let result = store.assign_role(membership.id, &foreign, IdentityId::new(), false);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn make_primary_keeps_invariant() {
        let store = MembershipStore::new();
        let identity = IdentityId::new();
        let tenant = TenantId::new();
        let staff = staff_role();
        let membership = store.ensure(identity, tenant, &staff).unwrap();

        let catalog = PermissionCatalog::seeded();
        let doctor = system_roles(&catalog).into_iter().find(|r| r.name == "doctor").unwrap();

        let updated = store
            .assign_role(membership.id, &doctor, IdentityId::new(), true)
            .unwrap();
        assert!(updated.has_exactly_one_primary());
        assert_eq!(updated.primary_role_id(), doctor.id);
    }

    #[test]
    fn unknown_override_permission_rejected() {
        let store = MembershipStore::new();
        let identity = IdentityId::new();
        let tenant = TenantId::new();
        let membership = store.ensure(identity, tenant, &staff_role()).unwrap();

        let catalog = PermissionCatalog::seeded();
        let result = store.set_override(
            membership.id,
            Permission::new("no_such_perm"),
            OverrideEffect::Deny,
            &catalog,
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
