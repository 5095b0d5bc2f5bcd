//! Resolver trait: the abstract interface for record persistence.
//!
//! This trait is the only seam between the core and its collaborators.
//! Implementations include the in-memory reference backend and SQLite.

use std::future::Future;

use async_trait::async_trait;
use veritas_core::{
    humanize_category, Assertion, CoreError, Document, Entity, HashUri, Record, RecordKind,
    Referenceable, Statement,
};

use crate::error::{Result, StoreError};

/// Longest snippet returned with a search hit.
pub const SNIPPET_LEN: usize = 120;

/// A directed edge: `source` references `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub source: HashUri,
    pub target: HashUri,
    /// Human label, usually the source record's summary.
    pub summary: String,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub uri: HashUri,
    pub snippet: String,
    /// Higher is better. Scales differ between backends.
    pub score: f64,
}

/// Raw stored content and its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    pub kind: RecordKind,
    pub content: String,
}

/// The Resolver trait: async interface for record persistence.
///
/// Every method returns a future, so callers bound any call with
/// `tokio::time::timeout`. Dropping the future abandons the wait.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Whether this backend should be seeded with sample data on first use.
    fn auto_init(&self) -> bool;

    // ───── Record Operations ─────

    /// Persist a record, its outgoing edges and its search text.
    ///
    /// Only assertions and documents contribute edges. Returns the address.
    async fn store(&self, record: &dyn Referenceable) -> Result<HashUri>;

    /// Raw content by address.
    async fn fetch_raw(&self, uri: &HashUri) -> Result<Stored>;

    /// Whether a record exists at this address.
    async fn contains(&self, uri: &HashUri) -> Result<bool>;

    // ───── Reference Graph ─────

    /// Add an edge. An existing edge with the same source and target is replaced.
    async fn store_ref(&self, reference: &Reference) -> Result<()>;

    /// All edges pointing at `target`, oldest first. Empty if none.
    async fn fetch_refs(&self, target: &HashUri) -> Result<Vec<Reference>>;

    // ───── Key Storage ─────

    /// Store a private-key transport string for an entity.
    async fn store_key(&self, uri: &HashUri, secret: &str) -> Result<()>;

    /// Fetch a private-key transport string. `KeyNotFound` if absent.
    async fn fetch_key(&self, uri: &HashUri) -> Result<String>;

    // ───── Search ─────

    /// Free-text search, best hits first.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Edges a record contributes to the graph when stored.
pub fn derived_refs(record: &dyn Referenceable) -> Vec<Reference> {
    match record.kind() {
        RecordKind::Assertion | RecordKind::Document => {
            let summary = record.summary();
            record
                .references()
                .into_iter()
                .map(|target| Reference {
                    source: record.uri().clone(),
                    target,
                    summary: summary.clone(),
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

/// Trim a summary to snippet length.
pub fn snippet(summary: &str) -> String {
    if summary.chars().count() <= SNIPPET_LEN {
        return summary.to_string();
    }
    let cut: String = summary.chars().take(SNIPPET_LEN - 3).collect();
    format!("{cut}...")
}

/// Extension trait for typed access on top of raw storage.
pub trait ResolverExt: Resolver {
    /// Fetch and parse a record of type `T`.
    ///
    /// `NotFound` if absent; `Parse` if the stored kind or bytes don't match.
    fn fetch<T: Referenceable + 'static>(
        &self,
        uri: &HashUri,
    ) -> impl Future<Output = Result<T>> + Send;

    /// Fetch and parse whatever record lives at `uri`.
    fn fetch_record(&self, uri: &HashUri) -> impl Future<Output = Result<Record>> + Send;

    fn fetch_statement(&self, uri: &HashUri) -> impl Future<Output = Result<Statement>> + Send;

    fn fetch_entity(&self, uri: &HashUri) -> impl Future<Output = Result<Entity>> + Send;

    fn fetch_assertion(&self, uri: &HashUri) -> impl Future<Output = Result<Assertion>> + Send;

    fn fetch_document(&self, uri: &HashUri) -> impl Future<Output = Result<Document>> + Send;

    /// Verify an assertion against its stored issuer entity.
    fn verify_assertion(&self, assertion: &Assertion) -> impl Future<Output = Result<()>> + Send;

    /// Inbound edges with summaries rebuilt from the referencing records.
    ///
    /// Edges whose records cannot be resolved keep their stored summary.
    fn describe_refs(&self, target: &HashUri)
        -> impl Future<Output = Result<Vec<Reference>>> + Send;
}

impl<S: Resolver + ?Sized> ResolverExt for S {
    async fn fetch<T: Referenceable + 'static>(&self, uri: &HashUri) -> Result<T> {
        let stored = self.fetch_raw(uri).await?;
        let record = T::parse_content(&stored.content)?;
        if record.kind() != stored.kind {
            return Err(StoreError::Parse(CoreError::WrongKind {
                expected: record.kind().as_str().into(),
                found: stored.kind.as_str().into(),
            }));
        }
        Ok(record)
    }

    async fn fetch_record(&self, uri: &HashUri) -> Result<Record> {
        let stored = self.fetch_raw(uri).await?;
        Ok(Record::parse(stored.kind, &stored.content)?)
    }

    async fn fetch_statement(&self, uri: &HashUri) -> Result<Statement> {
        self.fetch(uri).await
    }

    async fn fetch_entity(&self, uri: &HashUri) -> Result<Entity> {
        self.fetch(uri).await
    }

    async fn fetch_assertion(&self, uri: &HashUri) -> Result<Assertion> {
        self.fetch(uri).await
    }

    async fn fetch_document(&self, uri: &HashUri) -> Result<Document> {
        self.fetch(uri).await
    }

    async fn verify_assertion(&self, assertion: &Assertion) -> Result<()> {
        let issuer = match self.fetch_entity(assertion.issuer()).await {
            Ok(entity) => entity,
            Err(StoreError::NotFound(uri)) => return Err(StoreError::KeyNotFound(uri)),
            Err(e) => return Err(e),
        };
        assertion.verify_with(&issuer)?;
        Ok(())
    }

    async fn describe_refs(&self, target: &HashUri) -> Result<Vec<Reference>> {
        let refs = self.fetch_refs(target).await?;
        let mut described = Vec::with_capacity(refs.len());
        for mut reference in refs {
            if let Some(summary) = describe_source(self, &reference.source).await {
                reference.summary = summary;
            }
            described.push(reference);
        }
        Ok(described)
    }
}

async fn describe_source<S: Resolver + ?Sized>(store: &S, source: &HashUri) -> Option<String> {
    match store.fetch_record(source).await.ok()? {
        Record::Assertion(assertion) => {
            let issuer = store.fetch_entity(assertion.issuer()).await.ok()?;
            let subject = match store.fetch_record(assertion.subject()).await.ok()? {
                Record::Statement(statement) => statement.text().to_string(),
                other => other.summary(),
            };
            Some(format!(
                "{} claims that '{}' {}",
                issuer.common_name(),
                subject,
                humanize_category(assertion.category())
            ))
        }
        Record::Document(document) => {
            Some(format!("referenced in document '{}'", document.title()))
        }
        _ => None,
    }
}
