//! User records and signing authorization.

use serde::{Deserialize, Serialize};
use veritas_core::HashUri;

use crate::error::{AuthError, Result};
use crate::password::{hash_password, verify_password, PasswordPolicy};

/// Binds a user to an entity whose private key they may sign with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRef {
    pub entity: HashUri,
    pub label: String,
}

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    password_hash: String,
    #[serde(default)]
    keys: Vec<KeyRef>,
}

impl User {
    /// Create a user, hashing `password` under `policy`.
    pub fn new(id: impl Into<String>, password: &str, policy: &PasswordPolicy) -> Self {
        Self {
            id: id.into(),
            password_hash: hash_password(password, policy),
            keys: Vec::new(),
        }
    }

    /// Rebuild a user from a stored PHC hash.
    pub fn from_hash(id: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password_hash: password_hash.into(),
            keys: Vec::new(),
        }
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    /// Replace the password hash.
    pub fn set_password(&mut self, password: &str, policy: &PasswordPolicy) {
        self.password_hash = hash_password(password, policy);
    }

    /// Authorize signing as `entity`. Re-adding an entity updates its label.
    pub fn add_key(&mut self, entity: &HashUri, label: impl Into<String>) {
        let label = label.into();
        match self.keys.iter_mut().find(|k| &k.entity == entity) {
            Some(existing) => existing.label = label,
            None => self.keys.push(KeyRef {
                entity: entity.clone(),
                label,
            }),
        }
    }

    pub fn remove_key(&mut self, entity: &HashUri) {
        self.keys.retain(|k| &k.entity != entity);
    }

    pub fn keys(&self) -> &[KeyRef] {
        &self.keys
    }

    pub fn can_sign_with(&self, entity: &HashUri) -> bool {
        self.keys.iter().any(|k| &k.entity == entity)
    }

    /// Like [`User::can_sign_with`], as an error.
    pub fn authorize(&self, entity: &HashUri) -> Result<()> {
        if self.can_sign_with(entity) {
            Ok(())
        } else {
            Err(AuthError::NotAuthorized {
                user: self.id.clone(),
                entity: entity.clone(),
            })
        }
    }
}
