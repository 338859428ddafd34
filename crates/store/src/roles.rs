//! Role repository: seeded system roles plus tenant-owned custom roles.

use std::collections::HashMap;
use std::sync::RwLock;

use praxis_auth::{system_roles, Permission, PermissionCatalog, Role};
use praxis_core::{DomainError, DomainResult, RoleId, TenantId};

#[derive(Debug, Default)]
pub struct RoleRepository {
    inner: RwLock<HashMap<RoleId, Role>>,
}

fn validate_permissions(catalog: &PermissionCatalog, perms: &[Permission]) -> DomainResult<()> {
    for perm in perms {
        if !catalog.contains(perm.as_str()) {
            return Err(DomainError::validation(format!(
                "unknown permission '{perm}'"
            )));
        }
    }
    Ok(())
}

impl RoleRepository {
    /// Create a repository pre-populated with the system roles.
    pub fn seeded(catalog: &PermissionCatalog) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.inner.write().expect("role repository poisoned");
            for role in system_roles(catalog) {
                map.insert(role.id, role);
            }
        }
        repo
    }

    pub fn get(&self, id: RoleId) -> DomainResult<Role> {
        self.inner
            .read()
            .expect("role repository poisoned")
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// Look up a system role by name (e.g. the default provisioning role).
    pub fn system_role(&self, name: &str) -> Option<Role> {
        self.inner
            .read()
            .expect("role repository poisoned")
            .values()
            .find(|r| r.is_system_role && r.name == name)
            .cloned()
    }

    /// Roles assignable within a tenant: all system roles plus the tenant's
    /// own custom roles.
    pub fn visible_to(&self, tenant_id: TenantId) -> Vec<Role> {
        let map = self.inner.read().expect("role repository poisoned");
        let mut roles: Vec<Role> = map.values().filter(|r| r.visible_to(tenant_id)).cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Create a tenant-scoped custom role.
    pub fn create_custom(
        &self,
        tenant_id: TenantId,
        name: &str,
        permissions: Vec<Permission>,
        catalog: &PermissionCatalog,
    ) -> DomainResult<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("role name cannot be empty"));
        }
        validate_permissions(catalog, &permissions)?;

        let mut map = self.inner.write().expect("role repository poisoned");
        let taken = map
            .values()
            .any(|r| r.name == name && (r.is_system_role || r.tenant_id == Some(tenant_id)));
        if taken {
            return Err(DomainError::conflict(format!("role name '{name}' already in use")));
        }

        let role = Role::custom(tenant_id, name, permissions);
        map.insert(role.id, role.clone());
        Ok(role)
    }

    /// Replace a custom role's permission list.
    ///
    /// System roles are immutable at runtime; `tenant_id` must own the role.
    pub fn set_permissions(
        &self,
        role_id: RoleId,
        tenant_id: TenantId,
        permissions: Vec<Permission>,
        catalog: &PermissionCatalog,
    ) -> DomainResult<Role> {
        validate_permissions(catalog, &permissions)?;

        let mut map = self.inner.write().expect("role repository poisoned");
        let role = map.get_mut(&role_id).ok_or(DomainError::NotFound)?;
        if role.is_system_role {
            return Err(DomainError::validation("system roles are immutable"));
        }
        if role.tenant_id != Some(tenant_id) {
            return Err(DomainError::authorization("role belongs to another tenant"));
        }
        role.permissions = permissions;
        Ok(role.clone())
    }
}
