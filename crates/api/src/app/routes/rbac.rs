//! Permission catalog, role catalog management, and membership
//! administration. Management endpoints require the `manage_roles`
//! capability in the selected tenant.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use praxis_auth::Permission;
use praxis_core::{DomainError, MembershipId, RoleId};

use crate::app::{dto, errors, services::AppServices};
use crate::context::TenantContext;

fn manage_roles() -> Permission {
    Permission::new("manage_roles")
}

/// GET /permissions — the read-only permission catalog for administrative UIs.
pub async fn list_permissions(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let permissions: Vec<_> = services.catalog.all().collect();
    Json(serde_json::json!({ "permissions": permissions })).into_response()
}

/// GET /roles — system roles plus this tenant's custom roles.
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    if let Err(e) = tenant.require(&manage_roles()) {
        return errors::domain_error_response(e);
    }
    let roles = services.roles.visible_to(tenant.tenant_id());
    Json(serde_json::json!({ "roles": roles })).into_response()
}

/// POST /roles — create a tenant-scoped custom role.
pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::CreateRoleRequest>,
) -> axum::response::Response {
    if let Err(e) = tenant.require(&manage_roles()) {
        return errors::domain_error_response(e);
    }

    let permissions = body.permissions.into_iter().map(Permission::new).collect();
    match services
        .roles
        .create_custom(tenant.tenant_id(), &body.name, permissions, &services.catalog)
    {
        Ok(role) => (StatusCode::CREATED, Json(serde_json::json!({ "role": role }))).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

/// PUT /roles/:id/permissions — replace a custom role's permission list.
pub async fn set_role_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(role_id): Path<RoleId>,
    Json(body): Json<dto::SetRolePermissionsRequest>,
) -> axum::response::Response {
    if let Err(e) = tenant.require(&manage_roles()) {
        return errors::domain_error_response(e);
    }

    let permissions = body.permissions.into_iter().map(Permission::new).collect();
    match services
        .roles
        .set_permissions(role_id, tenant.tenant_id(), permissions, &services.catalog)
    {
        Ok(role) => Json(serde_json::json!({ "role": role })).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

/// Load a membership, scoped to the administrator's tenant. Memberships of
/// other tenants are indistinguishable from missing ones.
fn tenant_membership(
    services: &AppServices,
    tenant: &TenantContext,
    id: MembershipId,
) -> Result<praxis_auth::Membership, DomainError> {
    let membership = services.memberships.get(id)?;
    if membership.tenant_id != tenant.tenant_id() {
        return Err(DomainError::NotFound);
    }
    Ok(membership)
}

/// POST /memberships/:id/roles — grant a role, optionally promoting it to
/// primary.
pub async fn assign_membership_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(membership_id): Path<MembershipId>,
    Json(body): Json<dto::AssignRoleRequest>,
) -> axum::response::Response {
    if let Err(e) = tenant.require(&manage_roles()) {
        return errors::domain_error_response(e);
    }
    if let Err(e) = tenant_membership(&services, &tenant, membership_id) {
        return errors::domain_error_response(e);
    }

    let role = match services.roles.get(body.role_id) {
        Ok(role) => role,
        Err(e) => return errors::domain_error_response(e),
    };

    match services.memberships.assign_role(
        membership_id,
        &role,
        tenant.identity_id(),
        body.make_primary,
    ) {
        Ok(membership) => Json(serde_json::json!({ "membership": membership })).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

/// PUT /memberships/:id/overrides — set a grant/deny override. Takes effect
/// on the target's very next request; no token reissue involved.
pub async fn set_membership_override(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(membership_id): Path<MembershipId>,
    Json(body): Json<dto::SetOverrideRequest>,
) -> axum::response::Response {
    if let Err(e) = tenant.require(&manage_roles()) {
        return errors::domain_error_response(e);
    }
    if let Err(e) = tenant_membership(&services, &tenant, membership_id) {
        return errors::domain_error_response(e);
    }

    match services.memberships.set_override(
        membership_id,
        Permission::new(body.permission),
        body.effect,
        &services.catalog,
    ) {
        Ok(membership) => Json(serde_json::json!({ "membership": membership })).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

/// DELETE /memberships/:id — revoke access (soft deactivation).
pub async fn deactivate_membership(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(membership_id): Path<MembershipId>,
) -> axum::response::Response {
    if let Err(e) = tenant.require(&manage_roles()) {
        return errors::domain_error_response(e);
    }
    if let Err(e) = tenant_membership(&services, &tenant, membership_id) {
        return errors::domain_error_response(e);
    }

    match services.memberships.deactivate(membership_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}
