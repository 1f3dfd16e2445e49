use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::Result;
use crate::archive::EntityType;
use crate::db::migrations::get_last_rebuild;

/// Counts reported by `stats` and the `index_stats` tool.
#[derive(Debug, Serialize)]
pub struct IndexStats {
    pub entities: u64,
    pub by_type: BTreeMap<String, u64>,
    pub aliases: u64,
    pub refs: u64,
    /// Distinct documents with at least one ref.
    pub documents: u64,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rebuild: Option<String>,
}

/// Compute index statistics.
///
/// `db_path` is used for file size calculation; pass None for in-memory databases.
pub fn index_stats(conn: &Connection, db_path: Option<&Path>) -> Result<IndexStats> {
    let count = |sql: &str| -> Result<u64> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as u64)
    };

    let (oldest_ref, newest_ref) = ref_time_range(conn)?;
    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(IndexStats {
        entities: count("SELECT COUNT(*) FROM entities")?,
        by_type: count_by_type(conn)?,
        aliases: count("SELECT COUNT(*) FROM aliases")?,
        refs: count("SELECT COUNT(*) FROM refs")?,
        documents: count("SELECT COUNT(DISTINCT doc_id) FROM refs")?,
        db_size_bytes,
        oldest_ref,
        newest_ref,
        last_rebuild: get_last_rebuild(conn)?,
    })
}

/// Entity count per type, every type present even when zero.
fn count_by_type(conn: &Connection) -> Result<BTreeMap<String, u64>> {
    let mut map: BTreeMap<String, u64> = EntityType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), 0))
        .collect();

    let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM entities GROUP BY type")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    for (t, count) in rows {
        map.insert(t, count as u64);
    }
    Ok(map)
}

fn ref_time_range(conn: &Connection) -> Result<(Option<String>, Option<String>)> {
    let range = conn.query_row("SELECT MIN(ts), MAX(ts) FROM refs", [], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    Ok(range)
}
