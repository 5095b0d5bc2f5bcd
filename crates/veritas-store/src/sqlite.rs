//! SQLite implementation of the Resolver trait.
//!
//! The durable backend. It uses rusqlite with bundled SQLite, wrapped in
//! async via tokio::spawn_blocking. Search runs over a real inverted index
//! built with the core tokenizer.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use tracing::debug;

use veritas_core::{tokenize, HashUri, RecordKind, Referenceable};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{derived_refs, snippet, Reference, Resolver, SearchResult, Stored};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. Every operation runs on the blocking
/// pool, one transaction per write.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,

    /// Per-operation limit. `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout: None,
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout: None,
        })
    }

    /// Fail any operation that takes longer than `limit` with `StoreError::Timeout`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        });

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => task.await,
        };

        joined.map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }

    /// Run `f` in a transaction on the blocking pool.
    ///
    /// The transaction rolls back instead of committing once the timeout has
    /// passed, so a caller that saw `Timeout` finds nothing written. Only a
    /// commit already in progress at the deadline can still land.
    async fn write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = self.timeout.map(|limit| (Instant::now() + limit, limit));

        self.run(move |conn| {
            let tx = conn.transaction()?;
            let out = f(&tx)?;
            if let Some((deadline, limit)) = deadline {
                if Instant::now() >= deadline {
                    return Err(StoreError::Timeout(limit));
                }
            }
            tx.commit()?;
            Ok(out)
        })
        .await
    }
}

fn row_to_reference(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get("source")?, row.get("target")?, row.get("summary")?))
}

fn parse_column(value: &str) -> Result<HashUri> {
    HashUri::parse(value).map_err(|e| StoreError::InvalidData(e.to_string()))
}

#[async_trait]
impl Resolver for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn auto_init(&self) -> bool {
        false
    }

    async fn store(&self, record: &dyn Referenceable) -> Result<HashUri> {
        let uri = record.uri().clone();
        let hash = uri.hash().to_string();
        let kind = record.kind().tag();
        let content = record.content().to_string();
        let summary = record.summary();
        let terms = tokenize(&record.text_content());
        let edges = derived_refs(record);

        self.write(move |tx| {
            let now = now_millis();

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO records (hash, kind, content, summary, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![hash, kind, content, summary, now],
            )?;

            if inserted > 0 {
                let mut stmt =
                    tx.prepare("INSERT OR IGNORE INTO search_terms (term, hash) VALUES (?1, ?2)")?;
                for term in &terms {
                    stmt.execute(params![term, hash])?;
                }
            }

            for edge in &edges {
                upsert_ref(tx, edge, now)?;
            }

            Ok(())
        })
        .await?;

        debug!(backend = "sqlite", uri = %uri, kind = %record.kind(), "stored record");
        Ok(uri)
    }

    async fn fetch_raw(&self, uri: &HashUri) -> Result<Stored> {
        let lookup = uri.clone();
        debug!(backend = "sqlite", uri = %uri, "fetch");

        self.run(move |conn| {
            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT kind, content FROM records WHERE hash = ?1",
                    params![lookup.hash()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                Some((kind, content)) => Ok(Stored {
                    kind: RecordKind::from_name(&kind),
                    content,
                }),
                None => Err(StoreError::NotFound(lookup)),
            }
        })
        .await
    }

    async fn contains(&self, uri: &HashUri) -> Result<bool> {
        let hash = uri.hash().to_string();
        self.run(move |conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM records WHERE hash = ?1", params![hash], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn store_ref(&self, reference: &Reference) -> Result<()> {
        let reference = reference.clone();
        self.write(move |tx| upsert_ref(tx, &reference, now_millis()))
            .await
    }

    async fn fetch_refs(&self, target: &HashUri) -> Result<Vec<Reference>> {
        let target_hash = target.hash().to_string();

        let rows = self
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT source, target, summary FROM refs
                     WHERE target_hash = ?1 ORDER BY stored_at, rowid",
                )?;
                let rows = stmt
                    .query_map(params![target_hash], row_to_reference)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter()
            .map(|(source, target, summary)| {
                Ok(Reference {
                    source: parse_column(&source)?,
                    target: parse_column(&target)?,
                    summary,
                })
            })
            .collect()
    }

    async fn store_key(&self, uri: &HashUri, secret: &str) -> Result<()> {
        let hash = uri.hash().to_string();
        let secret = secret.to_string();
        debug!(backend = "sqlite", uri = %uri, "stored key");

        self.write(move |tx| {
            tx.execute(
                "INSERT OR REPLACE INTO keys (hash, secret, stored_at) VALUES (?1, ?2, ?3)",
                params![hash, secret, now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn fetch_key(&self, uri: &HashUri) -> Result<String> {
        let lookup = uri.clone();
        self.run(move |conn| {
            let secret: Option<String> = conn
                .query_row(
                    "SELECT secret FROM keys WHERE hash = ?1",
                    params![lookup.hash()],
                    |row| row.get(0),
                )
                .optional()?;
            secret.ok_or(StoreError::KeyNotFound(lookup))
        })
        .await
    }

    /// Ranked by the fraction of query terms each record matches.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let terms: Vec<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let total = terms.len() as f64;

        let rows = self
            .run(move |conn| {
                let placeholders = vec!["?"; terms.len()].join(", ");
                let sql = format!(
                    "SELECT r.hash, r.kind, r.summary, COUNT(*) AS hits
                     FROM search_terms t JOIN records r ON r.hash = t.hash
                     WHERE t.term IN ({placeholders})
                     GROUP BY r.hash
                     ORDER BY hits DESC, r.stored_at, r.rowid"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(terms.iter()), |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        debug!(backend = "sqlite", query, hits = rows.len(), "search");

        Ok(rows
            .into_iter()
            .map(|(hash, kind, summary, hits)| SearchResult {
                uri: HashUri::new(hash, Some(&kind)),
                snippet: snippet(&summary),
                score: hits as f64 / total,
            })
            .collect())
    }
}

fn upsert_ref(conn: &Connection, reference: &Reference, now: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO refs (source_hash, target_hash, source, target, summary, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (source_hash, target_hash)
         DO UPDATE SET source = excluded.source, target = excluded.target,
                       summary = excluded.summary",
        params![
            reference.source.hash(),
            reference.target.hash(),
            reference.source.to_string(),
            reference.target.to_string(),
            reference.summary,
            now,
        ],
    )?;
    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
