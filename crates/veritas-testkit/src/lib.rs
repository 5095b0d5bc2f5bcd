//! # Veritas Testkit
//!
//! Testing utilities for Veritas.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known contents with their expected addresses
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: An issuer identity wired to a memory store
//!
//! ## Golden Vectors
//!
//! ```rust
//! use veritas_testkit::vectors::{address_vectors, verify_all_vectors};
//!
//! for (name, ok, uri) in verify_all_vectors() {
//!     assert!(ok, "{name}: {uri}");
//! }
//! # let _ = address_vectors();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use veritas_testkit::generators::{document_from_params, DocumentParams};
//!
//! proptest! {
//!     #[test]
//!     fn document_address_is_deterministic(params: DocumentParams) {
//!         let d1 = document_from_params(&params).unwrap();
//!         let d2 = document_from_params(&params).unwrap();
//!         prop_assert_eq!(d1.uri(), d2.uri());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use veritas_testkit::fixtures::TestFixture;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let fixture = TestFixture::new("Alice").await?;
//!     let statement = fixture.statement("The sky is blue").await?;
//!     let assertion = fixture.assert(&statement, "IsTrue", 0.9).await?;
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{cheap_policy, init_tracing, multi_party_fixtures, TestFixture};
pub use generators::{document_from_params, DocumentParams};
pub use vectors::{address_vectors, verify_all_vectors, AddressVector};
