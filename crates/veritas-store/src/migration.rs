//! Database schema migrations for SQLite.
//!
//! Versioned: each migration transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// Idempotent: safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, crate::sqlite::now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Records, keyed by digest (addresses compare without kind)
        CREATE TABLE records (
            hash TEXT PRIMARY KEY,            -- 64 lowercase hex
            kind TEXT NOT NULL,               -- statement | entity | assertion | document
            content TEXT NOT NULL,            -- canonical content
            summary TEXT NOT NULL,
            stored_at INTEGER NOT NULL        -- Unix ms
        );

        -- Reference graph, one edge per (source, target)
        CREATE TABLE refs (
            source_hash TEXT NOT NULL,
            target_hash TEXT NOT NULL,
            source TEXT NOT NULL,             -- canonical address with kind
            target TEXT NOT NULL,
            summary TEXT NOT NULL,
            stored_at INTEGER NOT NULL,
            PRIMARY KEY (source_hash, target_hash)
        );

        -- Private-key transport strings
        CREATE TABLE keys (
            hash TEXT PRIMARY KEY,
            secret TEXT NOT NULL,
            stored_at INTEGER NOT NULL
        );

        -- Inverted search index
        CREATE TABLE search_terms (
            term TEXT NOT NULL,
            hash TEXT NOT NULL,
            PRIMARY KEY (term, hash)
        );

        CREATE INDEX idx_refs_target ON refs(target_hash, stored_at);
        CREATE INDEX idx_records_kind ON records(kind);
        CREATE INDEX idx_search_hash ON search_terms(hash);
        "#,
    )?;

    Ok(())
}
