pub mod auth;
pub mod rbac;
pub mod system;
pub mod tenants;
