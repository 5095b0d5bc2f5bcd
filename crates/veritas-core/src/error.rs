//! Error types for Veritas Core.

use thiserror::Error;

use crate::hashuri::HashUri;

/// Errors raised while building, encoding or parsing records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("cannot compute address: {0}")]
    Addressing(String),

    #[error("malformed certificate: {0}")]
    Certificate(String),

    #[error("malformed token: {0}")]
    Token(String),

    #[error("malformed document: {0}")]
    Document(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("confidence {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    #[error("expected {expected} record, found {found}")]
    WrongKind { expected: String, found: String },

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Errors raised when a well-formed assertion fails to establish trust.
///
/// These never indicate corrupt data: the record parsed fine, it just cannot
/// be presented as a valid claim.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("signature verification failed")]
    SignatureFailed,

    #[error("issuer mismatch: token names {claimed}, key belongs to {actual}")]
    IssuerMismatch { claimed: HashUri, actual: HashUri },

    #[error("assertion has expired")]
    Expired,

    #[error("no public key for issuer {0}")]
    KeyNotFound(HashUri),

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for VerificationError {
    fn from(e: CoreError) -> Self {
        VerificationError::StructuralError(e.to_string())
    }
}
