//! Read-only retrieval over the index.
//!
//! Every "most recent first" read orders by timestamp descending, ties broken
//! by document id descending (later sequence number first). Reads never fail
//! on missing data; they return empty results. Only malformed queries (an
//! inverted time range, an empty keyword) are errors.
//!
//! [`keyword_search`] is the one path that reads document files instead of
//! the index. It is meant as a fallback for terms that do not resolve and
//! should be given a time window whenever possible.

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Timelike, Utc};
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;
use std::collections::BTreeSet;

use super::aliases::{aliases_of, resolve};
use super::types::{DocMention, Entity, EntityId, EntitySummary};
use super::{doc_id_column, entity_from_row, format_ts, ts_column, IndexError, Result, ENTITY_COLUMNS};
use crate::archive::{DocId, DocumentStore, EntityType};

const RECENCY_ORDER: &str = "ORDER BY ts DESC, doc_id DESC";

fn doc_mention_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocMention> {
    Ok(DocMention {
        doc_id: doc_id_column(row, 0)?,
        ts: ts_column(row, 1)?,
    })
}

/// Documents referencing one entity, most recent first.
pub fn docs_of_entity(conn: &Connection, entity_id: &EntityId) -> Result<Vec<DocMention>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT doc_id, ts FROM refs WHERE entity_id = ?1 {RECENCY_ORDER}"
    ))?;
    let docs = stmt
        .query_map(params![entity_id.as_str()], doc_mention_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs)
}

/// Answer to an entity lookup.
#[derive(Debug, Clone, Serialize)]
pub struct EntityLookup {
    pub entity: Entity,
    pub aliases: Vec<String>,
    pub docs: Vec<DocMention>,
}

/// Resolve `term`, then fetch the entity's aliases and documents.
/// `Ok(None)` means the term does not resolve.
pub fn lookup(conn: &Connection, term: &str) -> Result<Option<EntityLookup>> {
    let Some(entity) = resolve(conn, term)? else {
        return Ok(None);
    };
    let aliases = aliases_of(conn, &entity.id)?;
    let docs = docs_of_entity(conn, &entity.id)?;
    Ok(Some(EntityLookup {
        entity,
        aliases,
        docs,
    }))
}

fn check_range(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(IndexError::Validation(format!(
            "invalid time range: start {} is after end {}",
            format_ts(start),
            format_ts(end)
        )));
    }
    Ok(())
}

/// Round up to the next whole second. Stored refs have second precision, so
/// `ts >= t` and `ts >= ceil(t)` select the same rows (likewise for `<`).
fn ceil_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    if t.nanosecond() == 0 {
        t
    } else {
        let whole = t.trunc_subsecs(0);
        whole.checked_add_signed(Duration::seconds(1)).unwrap_or(whole)
    }
}

/// Documents with refs timestamped in `[start, end)`, most recent first.
pub fn docs_in_time_range(
    conn: &Connection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DocMention>> {
    check_range(&start, &end)?;
    let (start, end) = (ceil_to_second(start), ceil_to_second(end));
    let mut stmt = conn.prepare(&format!(
        "SELECT doc_id, MAX(ts) AS ts FROM refs WHERE ts >= ?1 AND ts < ?2 \
         GROUP BY doc_id {RECENCY_ORDER}"
    ))?;
    let docs = stmt
        .query_map(params![format_ts(&start), format_ts(&end)], doc_mention_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs)
}

/// Entities of one type with their document counts, most recently mentioned first.
pub fn entities_of_type(conn: &Connection, entity_type: EntityType) -> Result<Vec<EntitySummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTITY_COLUMNS}, COUNT(r.doc_id) FROM entities e \
         LEFT JOIN refs r ON r.entity_id = e.id \
         WHERE e.type = ?1 \
         GROUP BY e.id \
         ORDER BY e.last_mentioned DESC, e.name COLLATE NOCASE"
    ))?;
    let entities = stmt
        .query_map(params![entity_type.as_str()], |row| {
            let doc_count: i64 = row.get(5)?;
            Ok(EntitySummary {
                entity: entity_from_row(row)?,
                doc_count: doc_count as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entities)
}

/// [`entities_of_type`] joined to each entity's ordered documents.
pub fn entities_of_type_with_docs(
    conn: &Connection,
    entity_type: EntityType,
) -> Result<Vec<(EntitySummary, Vec<DocMention>)>> {
    entities_of_type(conn, entity_type)?
        .into_iter()
        .map(|summary| {
            let docs = docs_of_entity(conn, &summary.entity.id)?;
            Ok((summary, docs))
        })
        .collect()
}

/// Documents whose refs include every one of `entity_ids`, most recent first.
///
/// Duplicate ids are ignored; an empty list matches nothing.
pub fn docs_mentioning_all(conn: &Connection, entity_ids: &[EntityId]) -> Result<Vec<DocMention>> {
    let unique: BTreeSet<&str> = entity_ids.iter().map(EntityId::as_str).collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; unique.len()].join(", ");
    let sql = format!(
        "SELECT doc_id, MAX(ts) AS ts FROM refs \
         WHERE entity_id IN ({placeholders}) \
         GROUP BY doc_id \
         HAVING COUNT(DISTINCT entity_id) = {} \
         {RECENCY_ORDER}",
        unique.len()
    );
    let mut stmt = conn.prepare(&sql)?;
    let docs = stmt
        .query_map(params_from_iter(unique.iter()), doc_mention_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs)
}

/// Answer to a cross-reference query by free-text terms.
#[derive(Debug, Clone, Serialize)]
pub struct CrossReference {
    pub resolved: Vec<Entity>,
    /// Terms that resolve to no entity. Any unresolved term empties `docs`.
    pub unresolved: Vec<String>,
    pub docs: Vec<DocMention>,
}

/// Resolve each term and intersect the documents of the resulting entities.
pub fn cross_reference(conn: &Connection, terms: &[&str]) -> Result<CrossReference> {
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    for term in terms {
        match resolve(conn, term)? {
            Some(entity) => resolved.push(entity),
            None => unresolved.push(term.to_string()),
        }
    }

    let docs = if unresolved.is_empty() {
        let ids: Vec<EntityId> = resolved.iter().map(|e| e.id.clone()).collect();
        docs_mentioning_all(conn, &ids)?
    } else {
        Vec::new()
    };

    Ok(CrossReference {
        resolved,
        unresolved,
        docs,
    })
}

/// Most recently mentioned entities, optionally of one type.
pub fn recent_entities(
    conn: &Connection,
    limit: usize,
    entity_type: Option<EntityType>,
) -> Result<Vec<Entity>> {
    let limit = limit as i64;
    let entities = match entity_type {
        Some(t) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.type = ?1 \
                 ORDER BY e.last_mentioned DESC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![t.as_str(), limit], entity_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTITY_COLUMNS} FROM entities e \
                 ORDER BY e.last_mentioned DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit], entity_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(entities)
}

/// Entities whose display name starts with `prefix` (case-insensitive), e.g.
/// every `repo` under an organisation path.
pub fn find_entities_like(conn: &Connection, prefix: &str) -> Result<Vec<Entity>> {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.name LIKE ?1 ESCAPE '\\' \
         ORDER BY e.last_mentioned DESC"
    ))?;
    let entities = stmt
        .query_map(params![format!("{escaped}%")], entity_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entities)
}

/// Every entity with its aliases, grouped by type then sorted by name.
pub fn list_entities_with_aliases(
    conn: &Connection,
    entity_type: Option<EntityType>,
) -> Result<Vec<(Entity, Vec<String>)>> {
    let types: Vec<EntityType> = match entity_type {
        Some(t) => vec![t],
        None => EntityType::ALL.to_vec(),
    };

    let mut out = Vec::new();
    for t in types {
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.type = ?1 \
             ORDER BY e.name COLLATE NOCASE"
        ))?;
        let entities = stmt
            .query_map(params![t.as_str()], entity_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for entity in entities {
            let aliases = aliases_of(conn, &entity.id)?;
            out.push((entity, aliases));
        }
    }
    Ok(out)
}

/// A keyword match in a document file.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordHit {
    pub doc_id: DocId,
    /// First matching line, trimmed.
    pub line: String,
}

/// Scan document content for `keyword` (case-insensitive), newest document first.
///
/// `window` bounds the scan by document date (`[start, end)` on the date part
/// of the identifier) so only files in range are read. A file that is not
/// valid UTF-8 counts as no match.
pub fn keyword_search(
    store: &DocumentStore,
    keyword: &str,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    limit: usize,
) -> Result<Vec<KeywordHit>> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return Err(IndexError::Validation("keyword must not be empty".into()));
    }
    let dates: Option<(NaiveDate, NaiveDate)> = match window {
        Some((start, end)) => {
            check_range(&start, &end)?;
            Some((start.date_naive(), end.date_naive()))
        }
        None => None,
    };

    let mut ids = store.list_ids()?;
    ids.reverse();

    let mut hits = Vec::new();
    for id in ids {
        if hits.len() >= limit {
            break;
        }
        if let Some((start, end)) = dates {
            if id.date < start || id.date >= end {
                continue;
            }
        }
        let content = match store.read_content(id) {
            Ok(Some(content)) => content,
            Ok(None) => continue,
            Err(IndexError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(doc_id = %id, error = %e, "document is not valid UTF-8, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };
        if let Some(line) = content.lines().find(|l| l.to_lowercase().contains(&needle)) {
            hits.push(KeywordHit {
                doc_id: id,
                line: line.trim().to_string(),
            });
        }
    }

    tracing::debug!(keyword = %keyword, hits = hits.len(), "keyword fallback scan");
    Ok(hits)
}
