use serde::Deserialize;

use praxis_auth::OverrideEffect;
use praxis_core::{RoleId, TenantId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectTenantRequest {
    pub tenant_id: TenantId,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetRolePermissionsRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: RoleId,
    #[serde(default)]
    pub make_primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    pub permission: String,
    pub effect: OverrideEffect,
}
