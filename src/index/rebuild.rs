//! Full reconstruction of the index from the document store.
//!
//! The index is a cache: [`rebuild`] discards it and replays every document in
//! identifier order inside one transaction, so readers keep seeing the old
//! index until the new one commits and a failure rolls back to it. Corrupt
//! documents are skipped and reported, never fatal.
//!
//! [`snapshot`] reduces an index to id-independent sets, which is how two
//! indexes are compared; [`verify_index`] uses it to diff the live index
//! against a fresh rebuild.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeSet;

use super::entities::index_document_in;
use super::{format_ts, Result};
use crate::archive::store::ScanEntry;
use crate::archive::{CorruptDocument, DocumentStore};
use crate::db::migrations::set_last_rebuild;

/// Summary of a rebuild run.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    /// Markdown files found under `log/`.
    pub files_seen: usize,
    pub documents_indexed: usize,
    pub mentions: usize,
    pub entities_created: usize,
    pub refs_added: usize,
    pub skipped: Vec<CorruptDocument>,
    pub finished_at: DateTime<Utc>,
}

impl RebuildReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Rebuild the index from `store`.
pub fn rebuild(conn: &mut Connection, store: &DocumentStore) -> Result<RebuildReport> {
    rebuild_with_progress(conn, store, |_, _| {})
}

/// Rebuild, calling `progress(done, total)` after each file.
pub fn rebuild_with_progress<F>(
    conn: &mut Connection,
    store: &DocumentStore,
    mut progress: F,
) -> Result<RebuildReport>
where
    F: FnMut(usize, usize),
{
    let entries = store.scan()?;
    let total = entries.len();
    tracing::info!(root = %store.root().display(), files = total, "rebuilding index");

    let tx = conn.transaction()?;
    tx.execute_batch(
        "DELETE FROM refs;
         DELETE FROM aliases;
         DELETE FROM entities;",
    )?;

    let mut report = RebuildReport {
        files_seen: total,
        documents_indexed: 0,
        mentions: 0,
        entities_created: 0,
        refs_added: 0,
        skipped: Vec::new(),
        finished_at: Utc::now(),
    };

    for (done, entry) in entries.into_iter().enumerate() {
        let parsed = match entry {
            ScanEntry::Document { id, .. } => store.read_document(id),
            ScanEntry::Stray { path } => Err(CorruptDocument {
                path,
                reason: "path does not match log/<YYYY-MM-DD>/<NNN>.md".into(),
            }),
        };

        match parsed {
            Ok(doc) => {
                let indexed = index_document_in(&tx, &doc)?;
                report.documents_indexed += 1;
                report.mentions += indexed.mentions;
                report.entities_created += indexed.entities_created;
                report.refs_added += indexed.refs_added;
            }
            Err(corrupt) => {
                tracing::warn!(
                    path = %corrupt.path.display(),
                    reason = %corrupt.reason,
                    "skipping corrupt document"
                );
                report.skipped.push(corrupt);
            }
        }

        progress(done + 1, total);
    }

    report.finished_at = Utc::now();
    set_last_rebuild(&tx, &format_ts(&report.finished_at))?;
    tx.commit()?;

    tracing::info!(
        documents = report.documents_indexed,
        entities = report.entities_created,
        skipped = report.skipped_count(),
        "rebuild complete"
    );
    Ok(report)
}

/// Index contents with surrogate ids replaced by canonical names, so two
/// indexes built at different times compare equal when they say the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSnapshot {
    /// (name, type, created, last_mentioned)
    pub entities: BTreeSet<(String, String, String, String)>,
    /// (alias key, canonical name)
    pub aliases: BTreeSet<(String, String)>,
    /// (canonical name, doc id, ts)
    pub refs: BTreeSet<(String, String, String)>,
}

/// Capture an [`IndexSnapshot`] of the index behind `conn`.
pub fn snapshot(conn: &Connection) -> Result<IndexSnapshot> {
    let mut stmt = conn.prepare("SELECT name, type, created, last_mentioned FROM entities")?;
    let entities = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT a.alias_key, e.name FROM aliases a JOIN entities e ON e.id = a.entity_id",
    )?;
    let aliases = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT e.name, r.doc_id, r.ts FROM refs r JOIN entities e ON e.id = r.entity_id",
    )?;
    let refs = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(IndexSnapshot {
        entities,
        aliases,
        refs,
    })
}

/// One side-by-side set comparison.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SetDiff {
    /// Rows present in the live index but not derivable from the documents.
    pub only_in_index: Vec<String>,
    /// Rows the documents imply that the live index is missing.
    pub only_in_documents: Vec<String>,
}

impl SetDiff {
    fn between<T: Ord + std::fmt::Debug>(live: &BTreeSet<T>, rebuilt: &BTreeSet<T>) -> Self {
        Self {
            only_in_index: live.difference(rebuilt).map(|row| format!("{row:?}")).collect(),
            only_in_documents: rebuilt.difference(live).map(|row| format!("{row:?}")).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.only_in_index.is_empty() && self.only_in_documents.is_empty()
    }
}

/// Differences between the live index and what the documents imply.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub entities: SetDiff,
    pub aliases: SetDiff,
    pub refs: SetDiff,
    pub skipped_documents: usize,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.entities.is_empty() && self.aliases.is_empty() && self.refs.is_empty()
    }
}

/// Rebuild into a scratch in-memory index and diff it against `conn`.
///
/// Aliases added by hand and merges are index-only state; they show up here as
/// drift because a rebuild would drop them.
pub fn verify_index(conn: &Connection, store: &DocumentStore) -> Result<DriftReport> {
    let mut scratch = crate::db::fresh_memory_index()?;
    let report = rebuild(&mut scratch, store)?;

    let live = snapshot(conn)?;
    let rebuilt = snapshot(&scratch)?;

    Ok(DriftReport {
        entities: SetDiff::between(&live.entities, &rebuilt.entities),
        aliases: SetDiff::between(&live.aliases, &rebuilt.aliases),
        refs: SetDiff::between(&live.refs, &rebuilt.refs),
        skipped_documents: report.skipped_count(),
    })
}
