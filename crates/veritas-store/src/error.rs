//! Error types for the store module.

use std::time::Duration;

use thiserror::Error;
use veritas_core::{CoreError, HashUri, VerificationError};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record at this address.
    #[error("record not found: {0}")]
    NotFound(HashUri),

    /// No key material at this address.
    #[error("key not found: {0}")]
    KeyNotFound(HashUri),

    /// Stored bytes do not match the requested record shape.
    #[error("parse failure: {0}")]
    Parse(#[from] CoreError),

    /// A well-formed assertion failed verification.
    #[error("verification failed: {0}")]
    Verification(#[from] VerificationError),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The backend did not answer within the configured limit.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
