//! Error types for the auth module.

use thiserror::Error;
use veritas_core::HashUri;

/// Errors that can occur during credential and key-sealing operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The user holds no key reference for this entity.
    #[error("user {user} may not sign as {entity}")]
    NotAuthorized { user: String, entity: HashUri },

    /// Hashing cost parameters were rejected.
    #[error("invalid password policy: {0}")]
    InvalidPolicy(String),

    /// Encryption error.
    #[error("sealing failed: {0}")]
    Sealing(String),

    /// Wrong passphrase or tampered ciphertext.
    #[error("unsealing failed")]
    Unsealing,

    /// Sealed string is not in the expected format.
    #[error("malformed sealed secret: {0}")]
    Malformed(String),
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
