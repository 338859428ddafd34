//! Context resolver middleware.
//!
//! `auth_middleware` verifies the bearer token and loads the identity;
//! `tenant_middleware` re-validates the tenant claim against live membership
//! state and evaluates the effective permission set fresh for the request.
//! Both fail closed: any failure stops the pipeline with an error envelope.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use praxis_core::DomainError;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantClaim, TenantContext};

#[derive(Clone)]
pub struct AuthState {
    pub services: Arc<AppServices>,
}

/// Verify the token and the identity behind it.
///
/// On success the request carries a [`PrincipalContext`] and the advisory
/// [`TenantClaim`] for the tenant middleware to re-validate.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(e) => return errors::domain_error_response(e),
    };

    let claims = match state.services.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            return errors::domain_error_response(DomainError::authentication(e.to_string()));
        }
    };

    // The subject must still exist and be active; a verified signature alone
    // is not enough.
    let identity = match state.services.identities.get_active(claims.sub) {
        Ok(identity) => identity,
        Err(e) => return errors::domain_error_response(e),
    };

    req.extensions_mut().insert(PrincipalContext::new(identity.id));
    req.extensions_mut().insert(TenantClaim(claims.tenant_id));

    next.run(req).await
}

/// Resolve the tenant-scoped execution context.
///
/// The tenant claim is never trusted on its own: the live membership is
/// loaded and must be active, closing the window where a revoked membership
/// would still pass stale-claim checks. Permissions are evaluated fresh.
pub async fn tenant_middleware(
    State(state): State<AuthState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>().cloned() else {
        return errors::domain_error_response(DomainError::authentication("not authenticated"));
    };
    let Some(TenantClaim(Some(tenant_id))) = req.extensions().get::<TenantClaim>().copied() else {
        return errors::domain_error_response(DomainError::TenantNotSelected);
    };

    let membership = match state
        .services
        .memberships
        .find_active(principal.identity_id(), tenant_id)
    {
        Ok(membership) => membership,
        Err(e) => return errors::domain_error_response(e),
    };

    let effective = state.services.effective_permissions(&membership);
    let role = state.services.primary_role_name(&membership);

    req.extensions_mut().insert(TenantContext::new(
        principal.identity_id(),
        tenant_id,
        membership.id,
        role,
        effective,
    ));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, DomainError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| DomainError::authentication("missing authorization header"))?;

    let header = header
        .to_str()
        .map_err(|_| DomainError::authentication("invalid authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| DomainError::authentication("expected bearer token"))?
        .trim();

    if token.is_empty() {
        return Err(DomainError::authentication("empty bearer token"));
    }

    Ok(token)
}
