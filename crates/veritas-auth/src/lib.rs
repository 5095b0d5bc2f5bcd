//! # Veritas Auth
//!
//! Credentials and private-key protection.
//!
//! ## Overview
//!
//! - **Users** hold a salted Argon2id password hash and key references
//!   naming the entities they may sign as.
//! - **Key sealing** encrypts private-key transport strings at rest with
//!   ChaCha20-Poly1305 under an Argon2id-derived key.
//!
//! Hashing fails closed: a rejected cost configuration yields an empty
//! hash, and an empty hash never verifies.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use veritas_auth::{PasswordPolicy, User};
//!
//! let policy = PasswordPolicy::default();
//! let user = User::new("alice", "correct-horse-battery-staple", &policy);
//! assert!(user.verify_password("correct-horse-battery-staple"));
//! ```

pub mod error;
pub mod password;
pub mod user;
pub mod vault;

pub use error::{AuthError, Result};
pub use password::{hash_password, verify_password, PasswordPolicy};
pub use user::{KeyRef, User};
pub use vault::{is_sealed, KeyVault};
