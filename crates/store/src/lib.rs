//! `praxis-store` — persistent-store repositories for the authorization core.
//!
//! In-memory `RwLock<HashMap>` implementations with the same contracts a
//! database-backed store would honor: uniqueness constraints on email, tenant
//! code, and the `(identity_id, tenant_id)` membership pair; soft
//! deactivation everywhere (records are never physically deleted).

pub mod identity;
pub mod membership;
pub mod roles;
pub mod tenant;

pub use identity::{Identity, IdentityStore};
pub use membership::MembershipStore;
pub use roles::RoleRepository;
pub use tenant::{Tenant, TenantDirectory};
