//! The derived entity index: entities, aliases, and document refs rebuilt from
//! the archive on demand.
//!
//! - [`entities`]: upserts, refs, document removal, renames
//! - [`aliases`]: resolution, alias registration, merges
//! - [`rebuild`]: full reconstruction from the document store, drift checks
//! - [`query`]: read-only retrieval patterns
//! - [`stats`]: counts for `stats` and `status`
//!
//! Mutations that touch more than one table run inside a transaction. Functions
//! suffixed `_in` take a plain `&Connection` and are meant to be called from
//! inside a caller's transaction.

pub mod aliases;
pub mod entities;
pub mod query;
pub mod rebuild;
pub mod stats;
pub mod types;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

use crate::archive::{DocId, EntityType};
pub use crate::error::{IndexError, Result};
use types::{Entity, EntityId};

/// Columns selected by [`entity_from_row`], in order.
pub(crate) const ENTITY_COLUMNS: &str = "e.id, e.name, e.type, e.created, e.last_mentioned";

/// Stored timestamp format: UTC, second precision, `Z` suffix. Lexical order
/// of these strings is chronological order.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Lookup key of an alias: trimmed, Unicode lowercase. Two alias texts with
/// the same key are the same alias.
pub(crate) fn alias_key(text: &str) -> String {
    text.trim().to_lowercase()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(crate) fn doc_id_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DocId> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: IndexError| conversion_error(idx, e))
}

pub(crate) fn entity_type_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<EntityType> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| conversion_error(idx, IndexError::Validation(e)))
}

/// Map a row selected with [`ENTITY_COLUMNS`] starting at column 0.
pub(crate) fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    Ok(Entity {
        id: EntityId(row.get(0)?),
        name: row.get(1)?,
        entity_type: entity_type_column(row, 2)?,
        created: ts_column(row, 3)?,
        last_mentioned: ts_column(row, 4)?,
    })
}
