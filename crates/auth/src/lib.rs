//! `praxis-auth` — pure authorization core (zero-trust).
//!
//! Everything in this crate is a deterministic function of its inputs:
//! permission/role catalogs, the membership model, the permission evaluator,
//! token issuance/verification, password hashing, and the scoped filter
//! builder. It is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod evaluate;
pub mod membership;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod scope;
pub mod token;

pub use claims::{validate_claims, SessionClaims, TokenValidationError};
pub use evaluate::{evaluate, require, AuthzError};
pub use membership::{Membership, OverrideEffect, PermissionOverride, RoleAssignment};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{Permission, PermissionCatalog, PermissionDef};
pub use roles::{system_roles, Role, DEFAULT_ROLE};
pub use scope::{FilterDescriptor, ResourceKind, RowRestriction, ScopeContext, ScopeRules};
pub use token::{Hs256TokenCodec, TokenError};
