//! `praxis-core` — domain foundation for the practice-management backend.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers and the error taxonomy shared by every layer.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{IdentityId, MembershipId, RoleId, TenantId};
