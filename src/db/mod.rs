pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Open (or create) the index database at the given path with the schema
/// initialized and migrations applied.
///
/// The returned connection is the index handle: every component borrows it,
/// and [`close_database`] ends its lifecycle.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // WAL lets a reader inspect the index while the single writer works
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "index database opened");
    Ok(conn)
}

/// Open an isolated in-memory index, fully migrated.
pub fn open_memory_database() -> Result<Connection> {
    fresh_memory_index().context("failed to open in-memory database")
}

pub(crate) fn fresh_memory_index() -> rusqlite::Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn)?;
    migrations::run_migrations(&mut conn)?;
    Ok(conn)
}

/// Close the index, surfacing any error SQLite reports on close.
pub fn close_database(conn: Connection) -> Result<()> {
    conn.close()
        .map_err(|(_, e)| e)
        .context("failed to close database")?;
    tracing::debug!("index database closed");
    Ok(())
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub schema_version: u32,
    pub entity_count: u64,
    pub alias_count: u64,
    pub ref_count: u64,
    pub last_rebuild: Option<String>,
}

/// Run `PRAGMA integrity_check` and gather row counts.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let integrity_details: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .context("integrity check failed to run")?;

    let count = |table: &str| -> Result<u64> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(n as u64)
    };

    Ok(HealthReport {
        integrity_ok: integrity_details == "ok",
        schema_version: migrations::get_schema_version(conn)?,
        entity_count: count("entities")?,
        alias_count: count("aliases")?,
        ref_count: count("refs")?,
        last_rebuild: migrations::get_last_rebuild(conn)?,
        integrity_details,
    })
}
