//! # Veritas
//!
//! The unified API for Veritas: identities publish content-addressed
//! statements, sign assertions about them and compose both into documents.
//!
//! ## Overview
//!
//! - **Entities**: signing identities backed by self-signed certificates
//! - **Statements**: opaque claims addressed by the hash of their text
//! - **Assertions**: EdDSA-signed opinions about a record
//! - **Documents**: XML compositions citing statements and assertions
//!
//! Every record is addressed by the SHA-256 of its canonical content. A
//! reference graph answers "who points at this" without re-reading signed
//! payloads.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use veritas::{Ledger, LedgerConfig};
//! use veritas::core::Referenceable;
//! use veritas::store::MemoryStore;
//!
//! async fn example() -> veritas::Result<()> {
//!     let ledger = Ledger::open(MemoryStore::new(), LedgerConfig::default()).await?;
//!
//!     let alice = ledger.issue_entity("Alice").await?;
//!     let claim = ledger.publish_statement("The sky is blue").await?;
//!     let assertion = ledger
//!         .assert(claim.uri(), alice.uri(), "IsTrue", 0.9)
//!         .await?;
//!
//!     ledger.verify(&assertion).await?;
//!     for reference in ledger.refs(claim.uri()).await? {
//!         println!("{}", reference.summary);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `veritas::core` - Addresses, records, certificates and tokens
//! - `veritas::store` - The resolver trait and its backends
//! - `veritas::auth` - Users, password hashing and key sealing

pub mod error;
pub mod ledger;
pub mod seed;

// Re-export component crates
pub use veritas_auth as auth;
pub use veritas_core as core;
pub use veritas_store as store;

pub use error::{Incident, LedgerError, Result};
pub use ledger::{Ledger, LedgerConfig};
pub use seed::SeedReport;

pub use veritas_core::{
    Assertion, Document, DocumentBuilder, Entity, HashUri, Keypair, Record, RecordKind,
    Referenceable, Statement,
};
