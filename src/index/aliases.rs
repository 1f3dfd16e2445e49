//! Alias resolution and entity merges.
//!
//! Alias text is unique case-insensitively across the whole table: rows are
//! keyed by `alias_key`, the Unicode-lowercased text, so one alias resolves
//! to at most one entity. Several aliases may point at the same entity.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::entities::get_entity;
use super::types::{Alias, Entity, EntityId};
use super::{
    alias_key, entity_from_row, entity_type_column, format_ts, IndexError, Result, ENTITY_COLUMNS,
};

/// Resolve free text to its canonical entity, case-insensitively.
///
/// `Ok(None)` is the ordinary "no such entity" answer, not an error.
pub fn resolve(conn: &Connection, text: &str) -> Result<Option<Entity>> {
    let key = alias_key(text);
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
    Ok(entity)
}

/// Register an entity's own display name as an alias of itself.
pub fn register_self_alias(conn: &Connection, entity: &Entity) -> Result<bool> {
    add_alias(conn, &entity.name, &entity.id)
}

/// Point `text` at `entity_id`.
///
/// Returns `true` if a new alias row was written, `false` if the alias already
/// resolved to this entity. Fails with [`IndexError::Conflict`] if it resolves
/// to a different entity; the existing mapping is left untouched.
pub fn add_alias(conn: &Connection, text: &str, entity_id: &EntityId) -> Result<bool> {
    let text = text.trim();
    if text.is_empty() {
        return Err(IndexError::Validation("alias must not be empty".into()));
    }

    let entity = get_entity(conn, entity_id)?
        .ok_or_else(|| IndexError::not_found("entity", entity_id.as_str()))?;

    if let Some(existing) = resolve(conn, text)? {
        if existing.id == entity.id {
            return Ok(false);
        }
        return Err(IndexError::Conflict(format!(
            "alias {text:?} already resolves to {} ({})",
            existing.name, existing.id
        )));
    }

    conn.execute(
        "INSERT INTO aliases (alias_key, alias, entity_id, entity_type) VALUES (?1, ?2, ?3, ?4)",
        params![alias_key(text), text, entity.id.as_str(), entity.entity_type.as_str()],
    )?;
    tracing::debug!(alias = %text, entity = %entity.name, "alias registered");
    Ok(true)
}

/// Every alias of one entity, alphabetically.
pub fn aliases_of(conn: &Connection, entity_id: &EntityId) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT alias FROM aliases WHERE entity_id = ?1 ORDER BY alias_key, alias")?;
    let aliases = stmt
        .query_map(params![entity_id.as_str()], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(aliases)
}

/// The whole alias table.
pub fn list_aliases(conn: &Connection) -> Result<Vec<Alias>> {
    let mut stmt = conn.prepare(
        "SELECT alias, entity_id, entity_type FROM aliases ORDER BY alias_key, alias",
    )?;
    let aliases = stmt
        .query_map([], |row| {
            Ok(Alias {
                alias: row.get(0)?,
                entity_id: EntityId(row.get(1)?),
                entity_type: entity_type_column(row, 2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(aliases)
}

/// Result of a [`merge`].
#[derive(Debug, Serialize)]
pub struct MergeOutcome {
    pub survivor: Entity,
    /// Aliases moved from the duplicate (its self-alias included).
    pub aliases_repointed: usize,
    /// Refs moved to the survivor.
    pub refs_repointed: usize,
    /// Refs dropped because the survivor already referenced the same document.
    pub refs_collapsed: usize,
}

/// Collapse `duplicate` into `survivor`: repoint every alias and ref, widen the
/// survivor's mention window, and delete the duplicate. All or nothing.
pub fn merge(
    conn: &mut Connection,
    duplicate: &EntityId,
    survivor: &EntityId,
) -> Result<MergeOutcome> {
    if duplicate == survivor {
        return Err(IndexError::Validation(format!(
            "cannot merge entity {duplicate} into itself"
        )));
    }

    let tx = conn.transaction()?;

    let dup = get_entity(&tx, duplicate)?
        .ok_or_else(|| IndexError::not_found("entity", duplicate.as_str()))?;
    let keep = get_entity(&tx, survivor)?
        .ok_or_else(|| IndexError::not_found("entity", survivor.as_str()))?;

    let aliases_repointed = tx.execute(
        "UPDATE aliases SET entity_id = ?1, entity_type = ?2 WHERE entity_id = ?3",
        params![keep.id.as_str(), keep.entity_type.as_str(), dup.id.as_str()],
    )?;

    let refs_repointed = tx.execute(
        "INSERT OR IGNORE INTO refs (entity_id, doc_id, ts) \
         SELECT ?1, doc_id, ts FROM refs WHERE entity_id = ?2",
        params![keep.id.as_str(), dup.id.as_str()],
    )?;
    let refs_removed = tx.execute("DELETE FROM refs WHERE entity_id = ?1", params![dup.id.as_str()])?;

    let created = format_ts(&keep.created.min(dup.created));
    let last_mentioned = format_ts(&keep.last_mentioned.max(dup.last_mentioned));
    tx.execute(
        "UPDATE entities SET created = ?1, last_mentioned = ?2 WHERE id = ?3",
        params![created, last_mentioned, keep.id.as_str()],
    )?;

    tx.execute("DELETE FROM entities WHERE id = ?1", params![dup.id.as_str()])?;

    let survivor_entity = get_entity(&tx, survivor)?
        .ok_or_else(|| IndexError::not_found("entity", survivor.as_str()))?;

    tx.commit()?;

    tracing::info!(
        duplicate = %dup.name,
        survivor = %keep.name,
        aliases_repointed,
        refs_repointed,
        "entities merged"
    );

    Ok(MergeOutcome {
        survivor: survivor_entity,
        aliases_repointed,
        refs_repointed,
        refs_collapsed: refs_removed - refs_repointed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::EntityType;
    use crate::db;
    use crate::index::entities::upsert_entity;
    use chrono::{TimeZone, Utc};

    fn upsert(conn: &mut Connection, name: &str, entity_type: EntityType) -> Entity {
        let at = Utc.with_ymd_and_hms(2025, 12, 24, 0, 0, 0).unwrap();
        upsert_entity(conn, name, entity_type, at).unwrap().entity
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let mut conn = db::open_memory_database().unwrap();
        let sam = upsert(&mut conn, "Sam", EntityType::Person);

        for text in ["Sam", "sam", "SAM", "  sam "] {
            assert_eq!(resolve(&conn, text).unwrap().unwrap().id, sam.id);
        }
        assert!(resolve(&conn, "samuel").unwrap().is_none());
        assert!(resolve(&conn, "").unwrap().is_none());
    }

    #[test]
    fn add_alias_is_idempotent_for_same_entity() {
        let mut conn = db::open_memory_database().unwrap();
        let cc = upsert(&mut conn, "Claude Code", EntityType::Tool);

        assert!(add_alias(&conn, "CC", &cc.id).unwrap());
        assert!(!add_alias(&conn, "cc", &cc.id).unwrap());
        assert_eq!(aliases_of(&conn, &cc.id).unwrap(), vec!["CC", "Claude Code"]);
    }

    #[test]
    fn resolve_folds_non_ascii_case() {
        let mut conn = db::open_memory_database().unwrap();
        let emile = upsert(&mut conn, "Émile", EntityType::Person);

        for text in ["émile", "ÉMILE", " Émile "] {
            assert_eq!(resolve(&conn, text).unwrap().unwrap().id, emile.id, "{text}");
        }
        assert!(!add_alias(&conn, "ÉMILE", &emile.id).unwrap());
        assert_eq!(aliases_of(&conn, &emile.id).unwrap(), vec!["Émile"]);
    }

    #[test]
    fn add_alias_requires_existing_entity() {
        let conn = db::open_memory_database().unwrap();
        let err = add_alias(&conn, "ghost", &EntityId::from("missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn merge_into_self_is_rejected() {
        let mut conn = db::open_memory_database().unwrap();
        let sam = upsert(&mut conn, "Sam", EntityType::Person);
        assert!(merge(&mut conn, &sam.id, &sam.id).unwrap_err().is_validation());
    }

    #[test]
    fn merge_with_missing_entity_changes_nothing() {
        let mut conn = db::open_memory_database().unwrap();
        let sam = upsert(&mut conn, "Sam", EntityType::Person);

        let err = merge(&mut conn, &sam.id, &EntityId::from("missing")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(resolve(&conn, "sam").unwrap().unwrap().id, sam.id);
    }
}
