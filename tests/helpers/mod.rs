#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use spellbook::archive::{DocId, DocumentStore, EntityType};
use spellbook::db;
use std::path::Path;
use tempfile::TempDir;

/// Open a fresh in-memory index with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// A temporary vault with its `.spellbook` marker and a store at `knowledge/`.
/// Keep the `TempDir` alive for as long as the store is used.
pub fn test_vault() -> (TempDir, DocumentStore) {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(".spellbook"), "").unwrap();
    let store = DocumentStore::new(tmp.path().join("knowledge"));
    (tmp, store)
}

/// UTC timestamp on a day of December 2025.
pub fn dec(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, day, hour, 0, 0).unwrap()
}

pub fn doc_id(s: &str) -> DocId {
    s.parse().unwrap()
}

/// Write a well-formed document at `log/<date>/<seq>.md` with the given
/// mentions, using the structured entity list form.
pub fn write_doc(
    store: &DocumentStore,
    id: &str,
    ts: DateTime<Utc>,
    mentions: &[(&str, EntityType)],
) -> DocId {
    let id = doc_id(id);
    let mut yaml = format!(
        "id: {id}\ntype: insight\nts: {}\ntitle: Note {id}\nentities:\n",
        ts.to_rfc3339()
    );
    for (name, entity_type) in mentions {
        yaml.push_str(&format!("  - name: \"{name}\"\n    type: {entity_type}\n"));
    }
    write_raw(store, &id.relative_path(), &format!("---\n{yaml}---\n\nBody of {id}.\n"));
    id
}

/// Write arbitrary content (text or raw bytes) at a path relative to the store root.
pub fn write_raw(store: &DocumentStore, rel: &Path, content: impl AsRef<[u8]>) {
    let path = store.root().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
