//! Incremental write path: keep the index in step with single document writes
//! so a full rebuild is only needed after out-of-band edits.
//!
//! The document file is always written first. If indexing then fails the file
//! stays on disk and the next rebuild picks it up.

use rusqlite::Connection;
use serde::Serialize;

use crate::archive::{DocId, DocumentDraft, DocumentStore};
use crate::error::Result;
use crate::index::entities::{index_document, remove_document, IndexedDocument};

/// Result of archiving one document.
#[derive(Debug, Clone, Serialize)]
pub struct Archived {
    pub id: DocId,
    #[serde(flatten)]
    pub indexed: IndexedDocument,
}

/// Write `draft` to the store under the next free id for its date, then index it.
pub fn archive_document(
    conn: &mut Connection,
    store: &DocumentStore,
    draft: &DocumentDraft,
) -> Result<Archived> {
    let id = store.write(draft)?;
    let indexed = index_existing(conn, store, id).inspect_err(|e| {
        tracing::warn!(doc_id = %id, error = %e, "document written but not indexed");
    })?;
    Ok(Archived { id, indexed })
}

/// Index a document that is already in the store.
///
/// Re-indexing the same document adds no refs; entity mention windows are
/// only widened.
pub fn index_existing(conn: &mut Connection, store: &DocumentStore, id: DocId) -> Result<IndexedDocument> {
    let doc = store.load(id)?;
    index_document(conn, &doc)
}

/// Remove a document from the index and delete its file.
///
/// The refs are removed in a transaction that commits only once the file is
/// gone, so a failed delete leaves both the file and its refs in place.
pub fn forget_document(conn: &mut Connection, store: &DocumentStore, id: DocId) -> Result<usize> {
    if !store.path_of(id).exists() {
        return Err(crate::error::IndexError::not_found("document", id.to_string()));
    }
    let tx = conn.transaction()?;
    let removed = remove_document(&tx, id)?;
    store.delete(id).inspect_err(|e| {
        tracing::warn!(doc_id = %id, error = %e, "document file not deleted, refs kept");
    })?;
    tx.commit()?;
    Ok(removed)
}
