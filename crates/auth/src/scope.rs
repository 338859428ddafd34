//! Scoped filter builder: execution context + resource kind → data-access
//! predicate.
//!
//! Every descriptor carries tenant equality; row-level visibility rules are
//! selected from a per-resource-kind lookup table, never from inline role
//! branching scattered across handlers. Resource handlers must intersect
//! every query and every write's ownership check with the descriptor — as
//! defense in depth, not as the only line of scoping.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use praxis_core::{IdentityId, TenantId};

use crate::Permission;

/// Resource kinds the collaborating CRUD handlers manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Patients,
    Appointments,
    Invoices,
    Inventory,
    Leads,
    Payments,
}

/// Row-level restriction added on top of tenant equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRestriction {
    /// Tenant equality only.
    None,
    /// Only rows where this identity is the assigned clinician.
    AssignedClinician(IdentityId),
}

/// The predicate a resource handler must apply to every query and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub tenant_id: TenantId,
    pub restriction: RowRestriction,
}

impl FilterDescriptor {
    /// Evaluate the predicate against one row's scoping columns.
    pub fn matches_row(&self, row_tenant: TenantId, assigned_clinician: Option<IdentityId>) -> bool {
        if row_tenant != self.tenant_id {
            return false;
        }
        match self.restriction {
            RowRestriction::None => true,
            RowRestriction::AssignedClinician(id) => assigned_clinician == Some(id),
        }
    }
}

/// Inputs a scope rule may consult.
#[derive(Debug, Clone, Copy)]
pub struct ScopeContext<'a> {
    pub identity_id: IdentityId,
    pub tenant_id: TenantId,
    pub effective: &'a BTreeSet<Permission>,
}

type Rule = fn(&ScopeContext<'_>) -> RowRestriction;

/// Registry of row-level rules, one per resource kind.
pub struct ScopeRules {
    rules: HashMap<ResourceKind, Rule>,
}

/// Restrict to the assigned clinician unless the principal holds the
/// administrator-scope read permission for the kind.
fn restrict_unless(ctx: &ScopeContext<'_>, admin_perm: &str) -> RowRestriction {
    if ctx.effective.iter().any(|p| p.as_str() == admin_perm) {
        RowRestriction::None
    } else {
        RowRestriction::AssignedClinician(ctx.identity_id)
    }
}

fn patients_rule(ctx: &ScopeContext<'_>) -> RowRestriction {
    restrict_unless(ctx, "read_all_patients")
}

fn appointments_rule(ctx: &ScopeContext<'_>) -> RowRestriction {
    restrict_unless(ctx, "read_all_appointments")
}

impl ScopeRules {
    /// The standard rule set: patients and appointments are clinician-scoped;
    /// every other kind is tenant equality only.
    pub fn standard() -> Self {
        let mut rules: HashMap<ResourceKind, Rule> = HashMap::new();
        rules.insert(ResourceKind::Patients, patients_rule);
        rules.insert(ResourceKind::Appointments, appointments_rule);
        Self { rules }
    }

    /// Build the filter descriptor for a resource kind.
    pub fn build(&self, ctx: &ScopeContext<'_>, kind: ResourceKind) -> FilterDescriptor {
        let restriction = match self.rules.get(&kind) {
            Some(rule) => rule(ctx),
            None => RowRestriction::None,
        };
        FilterDescriptor {
            tenant_id: ctx.tenant_id,
            restriction,
        }
    }
}

impl Default for ScopeRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(effective: &BTreeSet<Permission>) -> (IdentityId, TenantId, ScopeContext<'_>) {
        let identity = IdentityId::new();
        let tenant = TenantId::new();
        (
            identity,
            tenant,
            ScopeContext {
                identity_id: identity,
                tenant_id: tenant,
                effective,
            },
        )
    }

    #[test]
    fn every_descriptor_carries_tenant_equality() {
        let effective = BTreeSet::new();
        let (_, tenant, ctx) = ctx(&effective);
        let rules = ScopeRules::standard();
        for kind in [
            ResourceKind::Patients,
            ResourceKind::Appointments,
            ResourceKind::Invoices,
            ResourceKind::Inventory,
            ResourceKind::Leads,
            ResourceKind::Payments,
        ] {
            assert_eq!(rules.build(&ctx, kind).tenant_id, tenant);
        }
    }

    #[test]
    fn clinician_without_admin_scope_is_restricted() {
        let effective = BTreeSet::from([Permission::new("read_appointments")]);
        let (identity, _, ctx) = ctx(&effective);
        let desc = ScopeRules::standard().build(&ctx, ResourceKind::Appointments);
        assert_eq!(desc.restriction, RowRestriction::AssignedClinician(identity));
    }

    #[test]
    fn admin_scope_lifts_restriction() {
        let effective = BTreeSet::from([
            Permission::new("read_appointments"),
            Permission::new("read_all_appointments"),
        ]);
        let (_, _, ctx) = ctx(&effective);
        let desc = ScopeRules::standard().build(&ctx, ResourceKind::Appointments);
        assert_eq!(desc.restriction, RowRestriction::None);
    }

    #[test]
    fn unlisted_kinds_are_tenant_only() {
        let effective = BTreeSet::new();
        let (_, _, ctx) = ctx(&effective);
        let desc = ScopeRules::standard().build(&ctx, ResourceKind::Payments);
        assert_eq!(desc.restriction, RowRestriction::None);
    }

    #[test]
    fn descriptor_rejects_cross_tenant_rows() {
        let effective = BTreeSet::new();
        let (_, tenant, ctx) = ctx(&effective);
        let desc = ScopeRules::standard().build(&ctx, ResourceKind::Invoices);

        assert!(desc.matches_row(tenant, None));
        assert!(!desc.matches_row(TenantId::new(), None));
    }

    #[test]
    fn restricted_descriptor_matches_only_own_rows() {
        let effective = BTreeSet::new();
        let (identity, tenant, ctx) = ctx(&effective);
        let desc = ScopeRules::standard().build(&ctx, ResourceKind::Patients);

        assert!(desc.matches_row(tenant, Some(identity)));
        assert!(!desc.matches_row(tenant, Some(IdentityId::new())));
        assert!(!desc.matches_row(tenant, None));
    }
}
