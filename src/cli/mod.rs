pub mod curate;
pub mod doctor;
pub mod entities;
pub mod lookup;
pub mod range;
pub mod rebuild;
pub mod stats;
pub mod status;
pub mod xref;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::PathBuf;

use spellbook::archive::frontmatter::parse_timestamp;
use spellbook::archive::DocumentStore;
use spellbook::config::SpellbookConfig;
use spellbook::index::aliases::resolve;
use spellbook::index::types::{DocMention, Entity};

/// An opened vault: index connection plus document store.
pub struct Vault {
    pub conn: Connection,
    pub store: DocumentStore,
    pub db_path: PathBuf,
}

/// Open the index and document store the config points at.
pub fn open_vault(config: &SpellbookConfig) -> Result<Vault> {
    let db_path = config.resolved_db_path()?;
    let store = DocumentStore::new(config.resolved_knowledge_dir()?);
    let conn = spellbook::db::open_database(&db_path)?;
    Ok(Vault {
        conn,
        store,
        db_path,
    })
}

/// Resolve a user-supplied name, failing with a readable message if unknown.
pub fn resolve_entity(conn: &Connection, term: &str) -> Result<Entity> {
    resolve(conn, term)?.with_context(|| format!("no entity matches {term:?}"))
}

/// Parse a time argument: RFC 3339, `YYYY-MM-DD HH:MM:SS`, or a bare date.
pub fn parse_time_arg(value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).map_err(anyhow::Error::msg)
}

pub fn print_docs(docs: &[DocMention]) {
    if docs.is_empty() {
        println!("  (no documents)");
        return;
    }
    for doc in docs {
        println!("  {}  {}", doc.doc_id, doc.ts.format("%Y-%m-%d %H:%M"));
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
