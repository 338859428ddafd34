//! Per-request execution contexts attached by the resolver middleware.

use std::collections::BTreeSet;

use praxis_auth::{
    require, FilterDescriptor, Permission, ResourceKind, ScopeContext, ScopeRules,
};
use praxis_core::{DomainError, IdentityId, MembershipId, TenantId};

/// Authenticated principal for a request (token verified, identity loaded
/// and active).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    identity_id: IdentityId,
}

impl PrincipalContext {
    pub fn new(identity_id: IdentityId) -> Self {
        Self { identity_id }
    }

    pub fn identity_id(&self) -> IdentityId {
        self.identity_id
    }
}

/// The tenant claim carried by the verified token. Advisory only — the
/// tenant middleware re-validates it against live membership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantClaim(pub Option<TenantId>);

/// Tenant-scoped execution context: live membership re-validated and the
/// effective permission set evaluated fresh for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    identity_id: IdentityId,
    tenant_id: TenantId,
    membership_id: MembershipId,
    role: String,
    effective: BTreeSet<Permission>,
}

impl TenantContext {
    pub fn new(
        identity_id: IdentityId,
        tenant_id: TenantId,
        membership_id: MembershipId,
        role: String,
        effective: BTreeSet<Permission>,
    ) -> Self {
        Self {
            identity_id,
            tenant_id,
            membership_id,
            role,
            effective,
        }
    }

    pub fn identity_id(&self) -> IdentityId {
        self.identity_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn membership_id(&self) -> MembershipId {
        self.membership_id
    }

    /// Primary role name (display/reporting).
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn effective_permissions(&self) -> &BTreeSet<Permission> {
        &self.effective
    }

    /// Fail-closed capability check.
    pub fn require(&self, permission: &Permission) -> Result<(), DomainError> {
        require(&self.effective, permission)
            .map_err(|e| DomainError::authorization(e.to_string()))
    }

    /// Build the data-access predicate resource handlers must apply to every
    /// query and write for `kind`.
    pub fn filter(&self, rules: &ScopeRules, kind: ResourceKind) -> FilterDescriptor {
        let ctx = ScopeContext {
            identity_id: self.identity_id,
            tenant_id: self.tenant_id,
            effective: &self.effective,
        };
        rules.build(&ctx, kind)
    }
}
