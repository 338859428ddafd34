//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// This taxonomy is the contract between the authorization core and the HTTP
/// layer: every variant has a fixed status-code mapping. Keep it focused on
/// deterministic failures; infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The caller could not be authenticated (bad token, bad credentials,
    /// inactive identity). Maps to 401.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A tenant-scoped operation was attempted without a selected tenant.
    /// Maps to 400.
    #[error("no tenant selected")]
    TenantNotSelected,

    /// The caller is authenticated but not allowed: no active membership in
    /// the claimed tenant, or the effective permission set lacks the required
    /// capability. Maps to 403.
    #[error("forbidden: {0}")]
    Authorization(String),

    /// A value failed validation (malformed input, unknown role/permission
    /// reference). Maps to 400.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness or concurrency conflict (duplicate email/code, racing
    /// membership creation that could not be resolved by upsert). Maps to 409.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A requested record was not found. Maps to 404.
    #[error("not found")]
    NotFound,

    /// An unexpected infrastructure failure. Maps to 500; the message is
    /// logged but never echoed to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
