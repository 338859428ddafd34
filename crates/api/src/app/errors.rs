//! Uniform JSON error envelopes.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use praxis_core::DomainError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map the domain taxonomy to HTTP. Internal causes are logged and replaced
/// with a generic message; everything else carries its own text.
pub fn domain_error_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Authentication(msg) => json_error(StatusCode::UNAUTHORIZED, "authentication_error", msg),
        DomainError::TenantNotSelected => {
            json_error(StatusCode::BAD_REQUEST, "tenant_not_selected", "no tenant selected")
        }
        DomainError::Authorization(msg) => json_error(StatusCode::FORBIDDEN, "authorization_error", msg),
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Internal(msg) => {
            tracing::error!(error = %msg, "internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}
