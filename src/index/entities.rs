//! Write path of the entity index: upserts, refs, document removal.
//!
//! [`index_document`] is the unit the archive uses: every mention of one
//! document is upserted and referenced inside a single transaction, so a
//! failure leaves no partial document in the index.

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::aliases::{add_alias, register_self_alias, resolve};
use super::types::{Entity, EntityId, UpsertOutcome};
use super::{alias_key, entity_from_row, format_ts, IndexError, Result, ENTITY_COLUMNS};
use crate::archive::{DocId, Document, EntityType};

/// Fetch an entity by id.
pub fn get_entity(conn: &Connection, id: &EntityId) -> Result<Option<Entity>> {
    let entity = conn
        .query_row(
            &format!("SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.id = ?1"),
            params![id.as_str()],
            entity_from_row,
        )
        .optional()?;
    Ok(entity)
}

/// Find an entity by its display name (case-insensitive), ignoring other aliases.
///
/// A display name is always one of its entity's aliases, so the lookup goes
/// through the alias key and then checks the hit is the name itself.
pub fn find_entity_by_name(conn: &Connection, name: &str) -> Result<Option<Entity>> {
    let key = alias_key(name);
    if key.is_empty() {
        return Ok(None);
    }
    let entity = conn
        .query_row(
            &format!(
                "SELECT {ENTITY_COLUMNS} FROM aliases a \
                 JOIN entities e ON e.id = a.entity_id \
                 WHERE a.alias_key = ?1"
            ),
            params![key],
            entity_from_row,
        )
        .optional()?;
    Ok(entity.filter(|e| alias_key(&e.name) == key))
}

/// Create the entity (with its self-alias) or widen its mention window.
///
/// An existing entity is found by resolving `name` through the alias table, so
/// names merged into a survivor keep landing on the survivor. `created` only
/// moves earlier and `last_mentioned` only moves later.
pub fn upsert_entity(
    conn: &mut Connection,
    name: &str,
    entity_type: EntityType,
    at: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    let tx = conn.transaction()?;
    let outcome = upsert_entity_in(&tx, name, entity_type, at)?;
    tx.commit()?;
    Ok(outcome)
}

pub(crate) fn upsert_entity_in(
    conn: &Connection,
    name: &str,
    entity_type: EntityType,
    at: DateTime<Utc>,
) -> Result<UpsertOutcome> {
    let name = name.trim();
    if name.is_empty() {
        return Err(IndexError::Validation("entity name must not be empty".into()));
    }
    // Stored timestamps have second precision
    let at = at.trunc_subsecs(0);

    if let Some(existing) = resolve(conn, name)? {
        if existing.entity_type != entity_type {
            tracing::warn!(
                entity = %existing.name,
                stored_type = %existing.entity_type,
                mentioned_type = %entity_type,
                "mention type differs from stored entity type, keeping stored type"
            );
        }

        let created = existing.created.min(at);
        let last_mentioned = existing.last_mentioned.max(at);
        if created != existing.created || last_mentioned != existing.last_mentioned {
            conn.execute(
                "UPDATE entities SET created = ?1, last_mentioned = ?2 WHERE id = ?3",
                params![format_ts(&created), format_ts(&last_mentioned), existing.id.as_str()],
            )?;
        }

        return Ok(UpsertOutcome {
            entity: Entity {
                created,
                last_mentioned,
                ..existing
            },
            created: false,
        });
    }

    let entity = Entity {
        id: EntityId::generate(),
        name: name.to_string(),
        entity_type,
        created: at,
        last_mentioned: at,
    };
    conn.execute(
        "INSERT INTO entities (id, name, type, created, last_mentioned) VALUES (?1, ?2, ?3, ?4, ?4)",
        params![
            entity.id.as_str(),
            entity.name,
            entity.entity_type.as_str(),
            format_ts(&at),
        ],
    )?;
    register_self_alias(conn, &entity)?;

    tracing::debug!(entity = %entity.name, entity_type = %entity.entity_type, "entity created");
    Ok(UpsertOutcome {
        entity,
        created: true,
    })
}

/// Record that `doc_id` mentions `entity_id`. Returns `false` if the pair was
/// already present (the call is then a no-op).
pub fn add_ref(
    conn: &Connection,
    entity_id: &EntityId,
    doc_id: DocId,
    at: DateTime<Utc>,
) -> Result<bool> {
    if get_entity(conn, entity_id)?.is_none() {
        return Err(IndexError::not_found("entity", entity_id.as_str()));
    }
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO refs (entity_id, doc_id, ts) VALUES (?1, ?2, ?3)",
        params![entity_id.as_str(), doc_id.to_string(), format_ts(&at)],
    )?;
    Ok(inserted > 0)
}

/// Drop every ref to `doc_id`. Entities left without refs are kept.
pub fn remove_document(conn: &Connection, doc_id: DocId) -> Result<usize> {
    let removed = conn.execute("DELETE FROM refs WHERE doc_id = ?1", params![doc_id.to_string()])?;
    tracing::info!(doc_id = %doc_id, refs_removed = removed, "document removed from index");
    Ok(removed)
}

/// Parse a document id supplied as text, for callers at the string boundary.
pub fn remove_document_by_key(conn: &Connection, doc_id: &str) -> Result<usize> {
    remove_document(conn, doc_id.parse()?)
}

/// What indexing one document changed.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct IndexedDocument {
    pub mentions: usize,
    pub entities_created: usize,
    pub refs_added: usize,
}

/// Upsert every mention of `doc` and link it, in one transaction.
pub fn index_document(conn: &mut Connection, doc: &Document) -> Result<IndexedDocument> {
    let tx = conn.transaction()?;
    let indexed = index_document_in(&tx, doc)?;
    tx.commit()?;
    tracing::info!(
        doc_id = %doc.id,
        mentions = indexed.mentions,
        entities_created = indexed.entities_created,
        "document indexed"
    );
    Ok(indexed)
}

pub(crate) fn index_document_in(conn: &Connection, doc: &Document) -> Result<IndexedDocument> {
    let mut indexed = IndexedDocument::default();
    for mention in &doc.entities {
        let outcome = upsert_entity_in(conn, &mention.name, mention.entity_type, doc.ts)?;
        indexed.mentions += 1;
        if outcome.created {
            indexed.entities_created += 1;
        }
        if add_ref(conn, &outcome.entity.id, doc.id, doc.ts)? {
            indexed.refs_added += 1;
        }
    }
    Ok(indexed)
}

/// Change an entity's display name. The new name becomes a self-alias; the
/// old name stays as an alias so earlier mentions still resolve.
pub fn rename_entity(conn: &mut Connection, id: &EntityId, new_name: &str) -> Result<Entity> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(IndexError::Validation("entity name must not be empty".into()));
    }

    let tx = conn.transaction()?;
    let entity = get_entity(&tx, id)?.ok_or_else(|| IndexError::not_found("entity", id.as_str()))?;

    add_alias(&tx, new_name, id)?;
    tx.execute(
        "UPDATE entities SET name = ?1 WHERE id = ?2",
        params![new_name, id.as_str()],
    )?;
    tx.commit()?;

    tracing::info!(from = %entity.name, to = %new_name, "entity renamed");
    Ok(Entity {
        name: new_name.to_string(),
        ..entity
    })
}
