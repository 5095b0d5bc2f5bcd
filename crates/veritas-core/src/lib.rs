//! # Veritas Core
//!
//! Pure primitives for Veritas: content addresses, records, certificates
//! and signed assertions.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! content-addressed records.
//!
//! ## Key Types
//!
//! - [`HashUri`] - Content address (SHA-256 plus an optional kind tag)
//! - [`Referenceable`] - Capability shared by every storable record
//! - [`Record`] - Closed union of [`Entity`], [`Statement`], [`Assertion`], [`Document`]
//! - [`Keypair`] - Ed25519 signing key
//!
//! ## Wire formats
//!
//! Entities are PEM-armored self-signed certificates, assertions are EdDSA
//! JWTs, documents are XML. See [`certificate`], [`token`] and
//! [`record::Document`].

pub mod certificate;
pub mod crypto;
pub mod error;
pub mod hashuri;
pub mod record;
pub mod sniff;
pub mod token;
pub mod tokenize;
pub mod validation;

pub use certificate::{Certificate, SerialNumber};
pub use crypto::{Keypair, PublicKey, Sha256Hash};
pub use error::{CoreError, VerificationError};
pub use hashuri::HashUri;
pub use record::{
    humanize_category, Assertion, Document, DocumentBuilder, Entity, Record, RecordKind,
    Referenceable, Span, SpanRef, Statement,
};
pub use sniff::guess_content_type;
pub use token::AssertionClaims;
pub use tokenize::tokenize;
pub use validation::{verify_assertion, KeyResolver};
