//! Service wiring and session-lifecycle operations.
//!
//! `AppServices` owns the stores, the seeded catalogs, the scope rule table,
//! and the token codec. Session transitions (login, select/switch/clear
//! tenant) are all implemented as "issue a new token with different claims";
//! there is no server-side session record.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::Serialize;

use praxis_auth::{
    evaluate, Hs256TokenCodec, Membership, Permission, PermissionCatalog, Role, ScopeRules,
    DEFAULT_ROLE,
};
use praxis_core::{DomainError, DomainResult, IdentityId, TenantId};
use praxis_store::{IdentityStore, MembershipStore, RoleRepository, TenantDirectory};

/// Runtime configuration (read from the environment in `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });
        let token_ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(praxis_auth::token::DEFAULT_TTL_HOURS);
        Self {
            jwt_secret,
            token_ttl_hours,
        }
    }
}

pub struct AppServices {
    pub identities: IdentityStore,
    pub tenants: TenantDirectory,
    pub roles: RoleRepository,
    pub memberships: MembershipStore,
    pub catalog: PermissionCatalog,
    pub scope_rules: ScopeRules,
    pub tokens: Hs256TokenCodec,
}

/// Result of selecting (or switching to) a tenant.
#[derive(Debug, Clone, Serialize)]
pub struct TenantSession {
    pub token: String,
    pub tenant_id: TenantId,
    pub role: String,
    pub effective_permissions: Vec<String>,
}

/// One entry of `GET /tenants/mine`.
#[derive(Debug, Clone, Serialize)]
pub struct TenantWithMembership {
    pub tenant_id: TenantId,
    pub code: String,
    pub name: String,
    pub has_membership: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let catalog = PermissionCatalog::seeded();
        let roles = RoleRepository::seeded(&catalog);
        Self {
            identities: IdentityStore::new(),
            tenants: TenantDirectory::new(),
            roles,
            memberships: MembershipStore::new(),
            catalog,
            scope_rules: ScopeRules::standard(),
            tokens: Hs256TokenCodec::new(
                config.jwt_secret.as_bytes(),
                Duration::hours(config.token_ttl_hours),
            ),
        }
    }

    fn issue(&self, identity_id: IdentityId, tenant_id: Option<TenantId>) -> DomainResult<String> {
        self.tokens
            .issue(identity_id, tenant_id)
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    /// Verify credentials and issue a tenant-less token.
    pub fn login(&self, email: &str, password: &str) -> DomainResult<String> {
        let identity = self.identities.verify_credential(email, password)?;
        tracing::info!(identity = %identity.id, "login");
        self.issue(identity.id, None)
    }

    /// Evaluate the effective permission set for a membership against the
    /// live role catalog. Called fresh per request; never cached.
    pub fn effective_permissions(&self, membership: &Membership) -> BTreeSet<Permission> {
        let roles: Vec<Role> = membership
            .role_ids()
            .filter_map(|id| self.roles.get(id).ok())
            .collect();
        evaluate(membership, |id| roles.iter().find(|r| r.id == id))
    }

    /// Display name of a membership's primary role.
    pub fn primary_role_name(&self, membership: &Membership) -> String {
        self.roles
            .get(membership.primary_role_id())
            .map(|r| r.name)
            .unwrap_or_default()
    }

    /// Select (or switch to) a tenant: validate the tenant, auto-provision a
    /// membership with the default role on first selection, and issue a
    /// tenant-bound token.
    pub fn select_tenant(
        &self,
        identity_id: IdentityId,
        tenant_id: TenantId,
    ) -> DomainResult<TenantSession> {
        let tenant = self.tenants.get_active(tenant_id)?;
        let default_role = self
            .roles
            .system_role(DEFAULT_ROLE)
            .ok_or_else(|| DomainError::internal("default role missing from seed"))?;

        let membership = self.memberships.ensure(identity_id, tenant.id, &default_role)?;
        let effective = self.effective_permissions(&membership);

        let token = self.issue(identity_id, Some(tenant.id))?;
        tracing::info!(identity = %identity_id, tenant = %tenant.id, "tenant selected");

        Ok(TenantSession {
            token,
            tenant_id: tenant.id,
            role: self.primary_role_name(&membership),
            effective_permissions: effective.iter().map(|p| p.as_str().to_string()).collect(),
        })
    }

    /// Drop the tenant claim: reissue a tenant-less token.
    pub fn clear_tenant(&self, identity_id: IdentityId) -> DomainResult<String> {
        self.issue(identity_id, None)
    }

    /// Active tenants annotated with this identity's membership status.
    pub fn my_tenants(&self, identity_id: IdentityId) -> Vec<TenantWithMembership> {
        self.tenants
            .list_active()
            .into_iter()
            .map(|tenant| {
                let membership = self
                    .memberships
                    .find(identity_id, tenant.id)
                    .filter(|m| m.is_active);
                TenantWithMembership {
                    tenant_id: tenant.id,
                    code: tenant.code,
                    name: tenant.name,
                    has_membership: membership.is_some(),
                    role: membership.as_ref().map(|m| self.primary_role_name(m)),
                }
            })
            .collect()
    }
}
