//! Tenant selection lifecycle: list, select, switch, clear, and the current
//! tenant's permission view.

use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, Json};

use crate::app::{dto, errors, services::AppServices};
use crate::context::{PrincipalContext, TenantContext};

pub async fn my_tenants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    let tenants = services.my_tenants(principal.identity_id());
    Json(serde_json::json!({ "tenants": tenants })).into_response()
}

pub async fn select_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::SelectTenantRequest>,
) -> axum::response::Response {
    match services.select_tenant(principal.identity_id(), body.tenant_id) {
        Ok(session) => Json(serde_json::json!(session)).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

/// Identical validation path to select; the previous tenant claim is simply
/// replaced in the reissued token.
pub async fn switch_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::SelectTenantRequest>,
) -> axum::response::Response {
    match services.select_tenant(principal.identity_id(), body.tenant_id) {
        Ok(session) => Json(serde_json::json!({ "token": session.token, "tenant_id": session.tenant_id }))
            .into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn clear_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.clear_tenant(principal.identity_id()) {
        Ok(token) => Json(serde_json::json!({ "token": token })).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

/// `{role, effective_permissions}` for the selected tenant, evaluated fresh
/// by the tenant middleware for this very request.
pub async fn current_permissions(
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    let permissions: Vec<&str> = tenant
        .effective_permissions()
        .iter()
        .map(|p| p.as_str())
        .collect();
    Json(serde_json::json!({
        "role": tenant.role(),
        "effective_permissions": permissions,
    }))
    .into_response()
}
