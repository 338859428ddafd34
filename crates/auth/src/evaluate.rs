//! Permission evaluator: membership + role catalog → effective permission set.
//!
//! Evaluation is pure and happens fresh on every request against live data.
//! There is no process-wide cache, so an administrative change takes effect
//! on the very next request without reissuing tokens.

use std::collections::BTreeSet;

use thiserror::Error;

use praxis_core::RoleId;

use crate::membership::{Membership, OverrideEffect};
use crate::{Permission, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Compute the effective permission set for a membership.
///
/// 1. Union the permission sets of every assigned role (not only the primary).
/// 2. Apply `Grant` overrides: add even if no role granted the permission.
/// 3. Apply `Deny` overrides last: remove even if a role granted it.
///
/// Deny wins over grant so revocation is reliable regardless of how many
/// roles the principal holds. Unknown role ids contribute nothing.
pub fn evaluate<'a, F>(membership: &Membership, role_lookup: F) -> BTreeSet<Permission>
where
    F: Fn(RoleId) -> Option<&'a Role>,
{
    let mut effective: BTreeSet<Permission> = BTreeSet::new();

    for role_id in membership.role_ids() {
        if let Some(role) = role_lookup(role_id) {
            effective.extend(role.permissions.iter().cloned());
        }
    }

    for o in &membership.overrides {
        if o.effect == OverrideEffect::Grant {
            effective.insert(o.permission.clone());
        }
    }

    for o in &membership.overrides {
        if o.effect == OverrideEffect::Deny {
            effective.remove(&o.permission);
        }
    }

    effective
}

/// Fail-closed capability check against an effective permission set.
pub fn require(effective: &BTreeSet<Permission>, required: &Permission) -> Result<(), AuthzError> {
    if effective.contains(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use praxis_core::{IdentityId, TenantId};
    use proptest::prelude::*;

    use crate::roles::Role;

    fn role_with(perms: &[&'static str]) -> Role {
        Role::system("test", perms.iter().map(|p| Permission::new(*p)).collect())
    }

    fn membership_for(role: &Role) -> Membership {
        Membership::new(IdentityId::new(), TenantId::new(), role.id, None, Utc::now())
    }

    #[test]
    fn union_covers_all_assigned_roles() {
        let a = role_with(&["read_patients"]);
        let b = role_with(&["read_invoices"]);
        let mut m = membership_for(&a);
        m.assign_role(b.id, None, false, Utc::now());

        let roles = [a.clone(), b.clone()];
        let effective = evaluate(&m, |id| roles.iter().find(|r| r.id == id));

        assert!(effective.contains(&Permission::new("read_patients")));
        assert!(effective.contains(&Permission::new("read_invoices")));
    }

    #[test]
    fn deny_override_removes_role_grant() {
        let role = role_with(&["write_patients", "read_patients"]);
        let mut m = membership_for(&role);
        m.set_override(Permission::new("write_patients"), OverrideEffect::Deny);

        let effective = evaluate(&m, |id| (id == role.id).then_some(&role));
        assert!(!effective.contains(&Permission::new("write_patients")));
        assert!(effective.contains(&Permission::new("read_patients")));
    }

    #[test]
    fn grant_override_adds_missing_permission() {
        let role = role_with(&["read_patients"]);
        let mut m = membership_for(&role);
        m.set_override(Permission::new("write_invoices"), OverrideEffect::Grant);

        let effective = evaluate(&m, |id| (id == role.id).then_some(&role));
        assert!(effective.contains(&Permission::new("write_invoices")));
    }

    #[test]
    fn deny_wins_even_with_grant_from_second_role() {
        let a = role_with(&["write_patients"]);
        let b = role_with(&["write_patients", "read_patients"]);
        let mut m = membership_for(&a);
        m.assign_role(b.id, None, false, Utc::now());
        m.set_override(Permission::new("write_patients"), OverrideEffect::Deny);

        let roles = [a.clone(), b.clone()];
        let effective = evaluate(&m, |id| roles.iter().find(|r| r.id == id));
        assert!(!effective.contains(&Permission::new("write_patients")));
    }

    #[test]
    fn unknown_role_contributes_nothing() {
        let role = role_with(&["read_patients"]);
        let m = membership_for(&role);
        let effective = evaluate(&m, |_| None);
        assert!(effective.is_empty());
    }

    #[test]
    fn require_fails_closed() {
        let effective = BTreeSet::from([Permission::new("read_patients")]);
        assert!(require(&effective, &Permission::new("read_patients")).is_ok());
        assert!(matches!(
            require(&effective, &Permission::new("write_patients")),
            Err(AuthzError::Forbidden(_))
        ));
    }

    fn perm_name() -> impl Strategy<Value = String> {
        "[a-z_]{3,12}"
    }

    proptest! {
        /// A denied permission never survives evaluation, no matter what the
        /// roles grant.
        #[test]
        fn deny_precedence_holds(
            role_perms in proptest::collection::vec(perm_name(), 0..8),
            denied in perm_name(),
        ) {
            let perms: Vec<Permission> =
                role_perms.iter().map(|p| Permission::new(p.clone())).collect();
            let role = Role::system("r", perms);
            let mut m = membership_for(&role);
            m.set_override(Permission::new(denied.clone()), OverrideEffect::Deny);

            let effective = evaluate(&m, |id| (id == role.id).then_some(&role));
            prop_assert!(!effective.contains(&Permission::new(denied)));
        }

        /// A granted permission is always present unless also denied.
        #[test]
        fn grant_is_effective_without_deny(
            role_perms in proptest::collection::vec(perm_name(), 0..8),
            granted in perm_name(),
        ) {
            let perms: Vec<Permission> =
                role_perms.iter().map(|p| Permission::new(p.clone())).collect();
            let role = Role::system("r", perms);
            let mut m = membership_for(&role);
            m.set_override(Permission::new(granted.clone()), OverrideEffect::Grant);

            let effective = evaluate(&m, |id| (id == role.id).then_some(&role));
            prop_assert!(effective.contains(&Permission::new(granted)));
        }
    }
}
