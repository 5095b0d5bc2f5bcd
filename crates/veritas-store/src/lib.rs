//! # Veritas Store
//!
//! The resolver abstraction for Veritas: one async trait for record
//! persistence, the reference graph, key storage and search, with in-memory
//! and SQLite implementations.
//!
//! ## Key Types
//!
//! - [`Resolver`] - The async trait for all storage operations
//! - [`ResolverExt`] - Typed fetches, verification and reference annotation
//! - [`MemoryStore`] - In-memory reference backend
//! - [`SqliteStore`] - SQLite-based persistent backend
//!
//! ## Usage
//!
//! ```rust,no_run
//! use veritas_core::{Referenceable, Statement};
//! use veritas_store::{MemoryStore, Resolver, ResolverExt};
//!
//! async fn example() -> veritas_store::Result<()> {
//!     let store = MemoryStore::new();
//!     let statement = Statement::new("The sky is blue");
//!     store.store(&statement).await?;
//!
//!     let fetched = store.fetch_statement(statement.uri()).await?;
//!     assert_eq!(fetched.text(), "The sky is blue");
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Content-addressed**: storing the same record twice is a no-op
//! - **Edges by target**: `fetch_refs` answers "what points to me"
//! - **Missing index entries** mean "no results", never an error

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Reference, Resolver, ResolverExt, SearchResult, Stored};
