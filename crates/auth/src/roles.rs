//! Role catalog: named, reusable permission sets.
//!
//! System roles are shared across all tenants and immutable by tenant admins;
//! custom roles are owned by exactly one tenant.

use serde::{Deserialize, Serialize};

use praxis_core::{RoleId, TenantId};

use crate::{Permission, PermissionCatalog};

/// The low-privilege role granted on first tenant selection.
pub const DEFAULT_ROLE: &str = "staff";

/// A named permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub is_system_role: bool,
    /// Owning tenant for custom roles; `None` for system roles.
    pub tenant_id: Option<TenantId>,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn system(name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            is_system_role: true,
            tenant_id: None,
            permissions,
        }
    }

    pub fn custom(tenant_id: TenantId, name: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            is_system_role: false,
            tenant_id: Some(tenant_id),
            permissions,
        }
    }

    /// Whether this role may be assigned within `tenant_id`.
    ///
    /// System roles are assignable anywhere; custom roles only inside the
    /// tenant that owns them.
    pub fn visible_to(&self, tenant_id: TenantId) -> bool {
        self.is_system_role || self.tenant_id == Some(tenant_id)
    }
}

fn perms(names: &[&'static str]) -> Vec<Permission> {
    names.iter().map(|n| Permission::new(*n)).collect()
}

/// The seeded system roles: admin, doctor, nurse, receptionist, accountant,
/// staff. Admin holds the full catalog.
pub fn system_roles(catalog: &PermissionCatalog) -> Vec<Role> {
    vec![
        Role::system("admin", catalog.names()),
        Role::system(
            "doctor",
            perms(&[
                "read_patients",
                "write_patients",
                "read_appointments",
                "write_appointments",
                "read_invoices",
            ]),
        ),
        Role::system(
            "nurse",
            perms(&[
                "read_patients",
                "write_patients",
                "read_appointments",
            ]),
        ),
        Role::system(
            "receptionist",
            perms(&[
                "read_patients",
                "read_appointments",
                "write_appointments",
                "read_all_appointments",
                "read_leads",
                "write_leads",
            ]),
        ),
        Role::system(
            "accountant",
            perms(&[
                "read_invoices",
                "write_invoices",
                "read_payments",
                "write_payments",
                "read_inventory",
            ]),
        ),
        Role::system(DEFAULT_ROLE, perms(&["read_patients", "read_appointments"])),
    ]
}
