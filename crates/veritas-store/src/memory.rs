//! In-memory implementation of the Resolver trait.
//!
//! This is the reference backend. Everything lives behind one coarse lock
//! and is lost when the store is dropped.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use veritas_core::{HashUri, Referenceable};

use crate::error::{Result, StoreError};
use crate::traits::{derived_refs, snippet, Reference, Resolver, SearchResult, Stored};

/// In-memory store implementation.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by address (kind-less equality).
    records: HashMap<HashUri, StoredRecord>,

    /// Insertion order, for stable search output.
    order: Vec<HashUri>,

    /// Edges indexed by target.
    refs: HashMap<HashUri, Vec<Reference>>,

    /// Private-key transport strings.
    keys: HashMap<HashUri, String>,
}

struct StoredRecord {
    /// Address including the kind tag.
    uri: HashUri,
    stored: Stored,
    summary: String,
    /// Lowercased text content.
    search_text: String,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn upsert_ref(&mut self, reference: Reference) {
        let edges = self.refs.entry(reference.target.clone()).or_default();
        match edges.iter_mut().find(|e| e.source == reference.source) {
            Some(existing) => *existing = reference,
            None => edges.push(reference),
        }
    }
}

#[async_trait]
impl Resolver for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn auto_init(&self) -> bool {
        true
    }

    async fn store(&self, record: &dyn Referenceable) -> Result<HashUri> {
        let uri = record.uri().clone();
        let edges = derived_refs(record);
        let mut inner = self.inner.write();

        if !inner.records.contains_key(&uri) {
            inner.records.insert(
                uri.clone(),
                StoredRecord {
                    uri: uri.clone(),
                    stored: Stored {
                        kind: record.kind(),
                        content: record.content().to_string(),
                    },
                    summary: record.summary(),
                    search_text: record.text_content().to_lowercase(),
                },
            );
            inner.order.push(uri.clone());
        }

        for edge in edges {
            inner.upsert_ref(edge);
        }

        debug!(backend = "memory", uri = %uri, kind = %record.kind(), "stored record");
        Ok(uri)
    }

    async fn fetch_raw(&self, uri: &HashUri) -> Result<Stored> {
        let inner = self.inner.read();
        debug!(backend = "memory", uri = %uri, "fetch");
        inner
            .records
            .get(uri)
            .map(|r| r.stored.clone())
            .ok_or_else(|| StoreError::NotFound(uri.clone()))
    }

    async fn contains(&self, uri: &HashUri) -> Result<bool> {
        Ok(self.inner.read().records.contains_key(uri))
    }

    async fn store_ref(&self, reference: &Reference) -> Result<()> {
        self.inner.write().upsert_ref(reference.clone());
        Ok(())
    }

    async fn fetch_refs(&self, target: &HashUri) -> Result<Vec<Reference>> {
        let inner = self.inner.read();
        Ok(inner.refs.get(target).cloned().unwrap_or_default())
    }

    async fn store_key(&self, uri: &HashUri, secret: &str) -> Result<()> {
        self.inner.write().keys.insert(uri.clone(), secret.to_string());
        debug!(backend = "memory", uri = %uri, "stored key");
        Ok(())
    }

    async fn fetch_key(&self, uri: &HashUri) -> Result<String> {
        self.inner
            .read()
            .keys
            .get(uri)
            .cloned()
            .ok_or_else(|| StoreError::KeyNotFound(uri.clone()))
    }

    /// Case-insensitive substring match over indexed text.
    ///
    /// Score is the number of occurrences.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.inner.read();
        let mut results: Vec<SearchResult> = inner
            .order
            .iter()
            .filter_map(|uri| inner.records.get(uri))
            .filter_map(|record| {
                let hits = record.search_text.matches(needle.as_str()).count();
                (hits > 0).then(|| SearchResult {
                    uri: record.uri.clone(),
                    snippet: snippet(&record.summary),
                    score: hits as f64,
                })
            })
            .collect();

        // Stable: equal scores keep insertion order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!(backend = "memory", query, hits = results.len(), "search");
        Ok(results)
    }
}
