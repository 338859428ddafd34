//! Tenant directory: clinic records with unique, normalized codes.
//!
//! Tenants are deactivated, never deleted, to preserve referential history.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use praxis_core::{DomainError, DomainResult, TenantId};

/// A clinic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct TenantMap {
    by_id: HashMap<TenantId, Tenant>,
    by_code: HashMap<String, TenantId>,
}

#[derive(Debug, Default)]
pub struct TenantDirectory {
    inner: RwLock<TenantMap>,
}

/// Lowercase, then validate against the fixed code pattern:
/// 3..=32 characters from `[a-z0-9-]`, starting alphanumeric.
fn normalize_code(code: &str) -> DomainResult<String> {
    let code = code.trim().to_lowercase();
    let valid_len = (3..=32).contains(&code.len());
    let valid_chars = code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_start = code.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    if !(valid_len && valid_chars && valid_start) {
        return Err(DomainError::validation(
            "tenant code must be 3-32 characters of [a-z0-9-], starting alphanumeric",
        ));
    }
    Ok(code)
}

impl TenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a new tenant. Fails with `Conflict` on a duplicate code.
    pub fn create(&self, code: &str, name: &str) -> DomainResult<Tenant> {
        let code = normalize_code(code)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("tenant name cannot be empty"));
        }

        let mut map = self.inner.write().expect("tenant directory poisoned");
        if map.by_code.contains_key(&code) {
            return Err(DomainError::conflict("tenant code already in use"));
        }

        let tenant = Tenant {
            id: TenantId::new(),
            code: code.clone(),
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        map.by_code.insert(code, tenant.id);
        map.by_id.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    pub fn get(&self, id: TenantId) -> DomainResult<Tenant> {
        self.inner
            .read()
            .expect("tenant directory poisoned")
            .by_id
            .get(&id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// A tenant usable as a selection target: exists and is active.
    pub fn get_active(&self, id: TenantId) -> DomainResult<Tenant> {
        let tenant = self.get(id)?;
        if !tenant.is_active {
            return Err(DomainError::NotFound);
        }
        Ok(tenant)
    }

    pub fn list_active(&self) -> Vec<Tenant> {
        let map = self.inner.read().expect("tenant directory poisoned");
        let mut tenants: Vec<Tenant> = map.by_id.values().filter(|t| t.is_active).cloned().collect();
        tenants.sort_by(|a, b| a.code.cmp(&b.code));
        tenants
    }

    pub fn deactivate(&self, id: TenantId) -> DomainResult<()> {
        let mut map = self.inner.write().expect("tenant directory poisoned");
        let tenant = map.by_id.get_mut(&id).ok_or(DomainError::NotFound)?;
        tenant.is_active = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_normalizes_code() {
        let dir = TenantDirectory::new();
        let tenant = dir.create("  North-Clinic-01 ", "North Clinic").unwrap();
        assert_eq!(tenant.code, "north-clinic-01");
    }

    #[test]
    fn duplicate_code_conflicts() {
        let dir = TenantDirectory::new();
        dir.create("clinic-a", "A").unwrap();
        let result = dir.create("CLINIC-A", "A again");
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn invalid_codes_rejected() {
        let dir = TenantDirectory::new();
        for bad in ["ab", "-leading-dash", "spaces in code", "ümlaut"] {
            assert!(
                matches!(dir.create(bad, "X"), Err(DomainError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn deactivated_tenant_leaves_active_list() {
        let dir = TenantDirectory::new();
        let a = dir.create("clinic-a", "A").unwrap();
        dir.create("clinic-b", "B").unwrap();

        dir.deactivate(a.id).unwrap();
        let active = dir.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "clinic-b");

        // Still retrievable (history preserved), but not selectable.
        assert!(dir.get(a.id).is_ok());
        assert!(matches!(dir.get_active(a.id), Err(DomainError::NotFound)));
    }
}
