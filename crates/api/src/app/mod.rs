//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: store/catalog/token wiring and session-lifecycle ops
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request DTOs
//! - `errors.rs`: uniform JSON error envelopes

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Extension, Router,
};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppConfig, AppServices};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: AppConfig) -> Router {
    build_app_with(Arc::new(AppServices::new(&config)))
}

/// Build the router around pre-constructed services. Tests use this to seed
/// tenants and memberships before driving the HTTP surface.
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        services: services.clone(),
    };

    // Tenant-scoped routes: token + identity + live membership required.
    let tenant_scoped = Router::new()
        .route("/tenant/permissions", get(routes::tenants::current_permissions))
        .route("/roles", get(routes::rbac::list_roles).post(routes::rbac::create_role))
        .route("/roles/:id/permissions", put(routes::rbac::set_role_permissions))
        .route("/memberships/:id/roles", post(routes::rbac::assign_membership_role))
        .route("/memberships/:id/overrides", put(routes::rbac::set_membership_override))
        .route("/memberships/:id", delete(routes::rbac::deactivate_membership))
        .layer(axum::middleware::from_fn_with_state(
            auth_state.clone(),
            middleware::tenant_middleware,
        ));

    // Authenticated routes: token + identity required, tenant optional.
    let authenticated = Router::new()
        .route("/tenants/mine", get(routes::tenants::my_tenants))
        .route("/tenant/select", post(routes::tenants::select_tenant))
        .route("/tenant/switch", post(routes::tenants::switch_tenant))
        .route("/tenant/clear", post(routes::tenants::clear_tenant))
        .route("/permissions", get(routes::rbac::list_permissions))
        .merge(tenant_scoped)
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .merge(authenticated)
        .layer(Extension(services))
}
