//! Error types for the Ledger.

use std::fmt;

use thiserror::Error;
use tracing::error;
use uuid::Uuid;
use veritas_auth::AuthError;
use veritas_core::{CoreError, VerificationError};
use veritas_store::StoreError;

/// Errors that can occur during Ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Record construction or parsing error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Assertion failed verification.
    #[error("verification error: {0}")]
    Verification(#[from] VerificationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Credential or key-sealing error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Public face of a failure: a stable code, a fixed message and a
/// correlation id. Internal error text never appears here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    pub code: &'static str,
    pub message: &'static str,
    pub id: Uuid,
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, incident {})", self.message, self.code, self.id)
    }
}

impl LedgerError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Core(e) => core_code(e),
            LedgerError::Verification(VerificationError::KeyNotFound(_)) => "E_KEY_NOT_FOUND",
            LedgerError::Verification(_) => "E_VERIFICATION",
            LedgerError::Store(e) => match e {
                StoreError::NotFound(_) => "E_NOT_FOUND",
                StoreError::KeyNotFound(_) => "E_KEY_NOT_FOUND",
                StoreError::Parse(e) => core_code(e),
                StoreError::Verification(VerificationError::KeyNotFound(_)) => "E_KEY_NOT_FOUND",
                StoreError::Verification(_) => "E_VERIFICATION",
                StoreError::Timeout(_) => "E_TIMEOUT",
                StoreError::Database(_)
                | StoreError::InvalidData(_)
                | StoreError::Migration(_) => "E_STORAGE",
            },
            LedgerError::Auth(AuthError::NotAuthorized { .. }) => "E_NOT_AUTHORIZED",
            LedgerError::Auth(_) => "E_CREDENTIALS",
        }
    }

    /// Map to a public incident and log the internal detail under its id.
    pub fn incident(&self) -> Incident {
        let code = self.code();
        let incident = Incident {
            code,
            message: public_message(code),
            id: Uuid::new_v4(),
        };
        error!(incident = %incident.id, code, error = %self, "request failed");
        incident
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == "E_NOT_FOUND"
    }
}

fn core_code(e: &CoreError) -> &'static str {
    match e {
        CoreError::Addressing(_) => "E_ADDRESSING",
        CoreError::InvalidKey(_) => "E_KEY_INVALID",
        _ => "E_PARSE",
    }
}

fn public_message(code: &str) -> &'static str {
    match code {
        "E_NOT_FOUND" => "The requested record does not exist.",
        "E_PARSE" => "The record could not be read.",
        "E_VERIFICATION" => "The assertion could not be verified.",
        "E_KEY_NOT_FOUND" => "No key is available for this identity.",
        "E_KEY_INVALID" => "The key material is invalid.",
        "E_ADDRESSING" => "The record is incomplete and has no address.",
        "E_NOT_AUTHORIZED" => "You are not allowed to sign as this identity.",
        "E_CREDENTIALS" => "Credentials could not be processed.",
        "E_TIMEOUT" => "The request timed out.",
        _ => "An internal error occurred.",
    }
}
