//! Registration and login.
//!
//! Login issues a tenant-less token; tenant selection happens afterwards via
//! the tenant routes.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{dto, errors, services::AppServices};

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    match services
        .identities
        .register(&body.email, &body.password, &body.display_name)
    {
        Ok(identity) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "identity_id": identity.id,
                "email": identity.email,
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    match services.login(&body.email, &body.password) {
        Ok(token) => Json(serde_json::json!({ "token": token })).into_response(),
        Err(e) => errors::domain_error_response(e),
    }
}
