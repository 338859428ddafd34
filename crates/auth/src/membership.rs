//! Membership: the join entity binding one identity to one tenant.
//!
//! # Invariants
//! - Exactly one role assignment has `is_primary = true`, at all times.
//! - At most one override per permission name.
//! - The `(identity_id, tenant_id)` pair is unique (enforced by the store).
//! - Memberships are deactivated, never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use praxis_core::{DomainError, IdentityId, MembershipId, RoleId, TenantId};

use crate::Permission;

/// One role granted to a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role_id: RoleId,
    pub assigned_at: DateTime<Utc>,
    /// The identity that performed the assignment; `None` for auto-provisioned
    /// default assignments.
    pub assigned_by: Option<IdentityId>,
    pub is_primary: bool,
}

/// Per-membership exception applied after role-derived permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideEffect {
    Grant,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    pub permission: Permission,
    pub effect: OverrideEffect,
}

/// The record granting an identity access to a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub identity_id: IdentityId,
    pub tenant_id: TenantId,
    pub role_assignments: Vec<RoleAssignment>,
    pub overrides: Vec<PermissionOverride>,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Create a membership with a single primary assignment to `role_id`.
    pub fn new(
        identity_id: IdentityId,
        tenant_id: TenantId,
        role_id: RoleId,
        assigned_by: Option<IdentityId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MembershipId::new(),
            identity_id,
            tenant_id,
            role_assignments: vec![RoleAssignment {
                role_id,
                assigned_at: now,
                assigned_by,
                is_primary: true,
            }],
            overrides: Vec::new(),
            is_active: true,
            joined_at: now,
        }
    }

    /// All assigned role ids (primary and secondary alike).
    pub fn role_ids(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.role_assignments.iter().map(|a| a.role_id)
    }

    /// The single assignment marked primary.
    pub fn primary_role_id(&self) -> RoleId {
        // The invariant guarantees exactly one; new() and assign_role()
        // cannot produce a membership without it.
        self.role_assignments
            .iter()
            .find(|a| a.is_primary)
            .map(|a| a.role_id)
            .unwrap_or_else(|| self.role_assignments[0].role_id)
    }

    /// Grant `role_id` to this membership.
    ///
    /// Idempotent on the role set: re-assigning an existing role only changes
    /// the primary marker when `make_primary` is set. The previous primary is
    /// demoted in the same step as the promotion, so there is never a window
    /// with two primaries or zero.
    pub fn assign_role(
        &mut self,
        role_id: RoleId,
        assigned_by: Option<IdentityId>,
        make_primary: bool,
        now: DateTime<Utc>,
    ) {
        let already = self.role_assignments.iter().any(|a| a.role_id == role_id);
        if !already {
            self.role_assignments.push(RoleAssignment {
                role_id,
                assigned_at: now,
                assigned_by,
                is_primary: false,
            });
        }
        if make_primary {
            for assignment in &mut self.role_assignments {
                assignment.is_primary = assignment.role_id == role_id;
            }
        }
    }

    /// Remove a role assignment. The primary assignment cannot be removed
    /// without first promoting another role.
    pub fn revoke_role(&mut self, role_id: RoleId) -> Result<(), DomainError> {
        let Some(assignment) = self.role_assignments.iter().find(|a| a.role_id == role_id) else {
            return Err(DomainError::validation("role is not assigned"));
        };
        if assignment.is_primary {
            return Err(DomainError::validation(
                "cannot revoke the primary role; promote another role first",
            ));
        }
        self.role_assignments.retain(|a| a.role_id != role_id);
        Ok(())
    }

    /// Set an override, replacing any existing override for the same
    /// permission name. Overrides are current state, not additive history.
    pub fn set_override(&mut self, permission: Permission, effect: OverrideEffect) {
        self.overrides.retain(|o| o.permission != permission);
        self.overrides.push(PermissionOverride { permission, effect });
    }

    pub fn clear_override(&mut self, permission: &Permission) {
        self.overrides.retain(|o| &o.permission != permission);
    }

    /// Reactivate a previously revoked membership, keeping its role and
    /// override history intact.
    pub fn reactivate(&mut self) {
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Check the primary-role invariant (used by store-level assertions and
    /// tests).
    pub fn has_exactly_one_primary(&self) -> bool {
        self.role_assignments.iter().filter(|a| a.is_primary).count() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Permission;

    fn membership() -> Membership {
        Membership::new(IdentityId::new(), TenantId::new(), RoleId::new(), None, Utc::now())
    }

    #[test]
    fn new_membership_has_one_primary() {
        let m = membership();
        assert!(m.has_exactly_one_primary());
        assert_eq!(m.primary_role_id(), m.role_assignments[0].role_id);
    }

    #[test]
    fn assign_secondary_keeps_primary() {
        let mut m = membership();
        let original_primary = m.primary_role_id();
        m.assign_role(RoleId::new(), Some(IdentityId::new()), false, Utc::now());
        assert!(m.has_exactly_one_primary());
        assert_eq!(m.primary_role_id(), original_primary);
        assert_eq!(m.role_assignments.len(), 2);
    }

    #[test]
    fn make_primary_demotes_previous() {
        let mut m = membership();
        let new_role = RoleId::new();
        m.assign_role(new_role, Some(IdentityId::new()), true, Utc::now());
        assert!(m.has_exactly_one_primary());
        assert_eq!(m.primary_role_id(), new_role);
    }

    #[test]
    fn reassign_existing_role_is_idempotent() {
        let mut m = membership();
        let role = m.primary_role_id();
        m.assign_role(role, None, true, Utc::now());
        assert_eq!(m.role_assignments.len(), 1);
        assert!(m.has_exactly_one_primary());
    }

    #[test]
    fn override_replaces_previous_entry() {
        let mut m = membership();
        let perm = Permission::new("write_patients");
        m.set_override(perm.clone(), OverrideEffect::Grant);
        m.set_override(perm.clone(), OverrideEffect::Deny);
        assert_eq!(m.overrides.len(), 1);
        assert_eq!(m.overrides[0].effect, OverrideEffect::Deny);
    }

    #[test]
    fn cannot_revoke_primary_role() {
        let mut m = membership();
        let primary = m.primary_role_id();
        assert!(m.revoke_role(primary).is_err());

        let secondary = RoleId::new();
        m.assign_role(secondary, None, false, Utc::now());
        m.revoke_role(secondary).unwrap();
        assert!(m.has_exactly_one_primary());
    }

    #[test]
    fn deactivate_preserves_history() {
        let mut m = membership();
        m.set_override(Permission::new("read_invoices"), OverrideEffect::Grant);
        m.deactivate();
        assert!(!m.is_active);
        assert_eq!(m.overrides.len(), 1);
        assert_eq!(m.role_assignments.len(), 1);

        m.reactivate();
        assert!(m.is_active);
        assert_eq!(m.overrides.len(), 1);
    }
}
