//! Identity and credential store.
//!
//! Holds only a one-way salted password hash; plaintext is never persisted
//! or compared directly. Identities are soft-deactivated, never deleted.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use praxis_auth::{hash_password, verify_password};
use praxis_core::{DomainError, DomainResult, IdentityId};

/// A principal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct IdentityMap {
    by_id: HashMap<IdentityId, Identity>,
    by_email: HashMap<String, IdentityId>,
}

/// Thread-safe identity repository with a uniqueness constraint on email.
#[derive(Debug, Default)]
pub struct IdentityStore {
    inner: RwLock<IdentityMap>,
}

fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email)
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new identity. Fails with `Conflict` on a duplicate email.
    pub fn register(
        &self,
        email: &str,
        raw_password: &str,
        display_name: &str,
    ) -> DomainResult<Identity> {
        let email = normalize_email(email)?;
        if raw_password.len() < 8 {
            return Err(DomainError::validation("password must be at least 8 characters"));
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }

        let password_hash = hash_password(raw_password)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let mut map = self.inner.write().expect("identity store poisoned");
        if map.by_email.contains_key(&email) {
            return Err(DomainError::conflict("email already registered"));
        }

        let identity = Identity {
            id: IdentityId::new(),
            email: email.clone(),
            display_name: display_name.to_string(),
            password_hash,
            is_active: true,
            created_at: Utc::now(),
        };
        map.by_email.insert(email, identity.id);
        map.by_id.insert(identity.id, identity.clone());
        Ok(identity)
    }

    /// Verify an email/password pair against the stored hash.
    ///
    /// Unknown email and wrong password fail identically so the endpoint does
    /// not leak which accounts exist.
    pub fn verify_credential(&self, email: &str, raw_password: &str) -> DomainResult<Identity> {
        let email = normalize_email(email)?;
        let map = self.inner.read().expect("identity store poisoned");

        let identity = map
            .by_email
            .get(&email)
            .and_then(|id| map.by_id.get(id))
            .ok_or_else(|| DomainError::authentication("invalid credentials"))?;

        let matches = verify_password(raw_password, &identity.password_hash)
            .map_err(|e| DomainError::authentication(e.to_string()))?;
        if !matches {
            return Err(DomainError::authentication("invalid credentials"));
        }
        if !identity.is_active {
            return Err(DomainError::authentication("account is inactive"));
        }
        Ok(identity.clone())
    }

    pub fn get(&self, id: IdentityId) -> Option<Identity> {
        self.inner
            .read()
            .expect("identity store poisoned")
            .by_id
            .get(&id)
            .cloned()
    }

    /// Load an identity for request authentication: must exist and be active.
    pub fn get_active(&self, id: IdentityId) -> DomainResult<Identity> {
        match self.get(id) {
            Some(identity) if identity.is_active => Ok(identity),
            _ => Err(DomainError::authentication("identity missing or inactive")),
        }
    }

    pub fn change_password(&self, id: IdentityId, raw_password: &str) -> DomainResult<()> {
        if raw_password.len() < 8 {
            return Err(DomainError::validation("password must be at least 8 characters"));
        }
        let hash = hash_password(raw_password)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let mut map = self.inner.write().expect("identity store poisoned");
        let identity = map.by_id.get_mut(&id).ok_or(DomainError::NotFound)?;
        identity.password_hash = hash;
        Ok(())
    }

    /// Soft-deactivate: subsequent credential checks and request
    /// authentication fail, but the record remains.
    pub fn deactivate(&self, id: IdentityId) -> DomainResult<()> {
        let mut map = self.inner.write().expect("identity store poisoned");
        let identity = map.by_id.get_mut(&id).ok_or(DomainError::NotFound)?;
        identity.is_active = false;
        Ok(())
    }
}
