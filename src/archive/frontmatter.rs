//! YAML front matter: parse-or-reject at the document boundary, and rendering
//! for newly archived documents.
//!
//! Two entity layouts are accepted on read:
//!
//! ```yaml
//! entities:              # grouped by category
//!   person: [Sam]
//!   tool: [rust, sqlite]
//! ```
//!
//! ```yaml
//! entities:              # structured list
//!   - { name: Sam, type: person }
//! ```
//!
//! Rendering always writes the grouped layout.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::types::{DocId, DocType, EntityType};
use super::{Document, DocumentDraft, EntityMention, RelatedDoc};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct RawFrontMatter {
    id: Option<String>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
    ts: Option<String>,
    date: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    related_docs: Vec<RawRelated>,
    source_session: Option<String>,
    #[serde(default)]
    source_files: Vec<String>,
    entities: Option<RawEntities>,
}

#[derive(Debug, Deserialize)]
struct RawRelated {
    id: String,
    relationship: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntities {
    Grouped(BTreeMap<String, Option<Vec<String>>>),
    Listed(Vec<RawMention>),
}

#[derive(Debug, Deserialize)]
struct RawMention {
    name: String,
    #[serde(rename = "type")]
    entity_type: String,
}

/// Split a markdown file into its front-matter YAML and body.
///
/// The first line must be `---` (a UTF-8 BOM is tolerated); the block ends at
/// the next `---` or `...` line.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');
    let first_end = content.find('\n')?;
    if content[..first_end].trim_end() != "---" {
        return None;
    }

    let yaml_start = first_end + 1;
    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse and validate a document. `Err` carries a human-readable reason used
/// for the rebuild's skipped-document report.
pub fn parse_document(id: DocId, content: &str) -> std::result::Result<Document, String> {
    let (yaml, body) = split_front_matter(content).ok_or("missing front matter")?;
    if yaml.trim().is_empty() {
        return Err("empty front matter".into());
    }

    let raw: RawFrontMatter =
        serde_yaml::from_str(yaml).map_err(|e| format!("invalid front matter: {e}"))?;

    if let Some(declared) = raw.id.as_deref() {
        if declared != id.to_string() {
            return Err(format!("front matter id {declared:?} does not match path id {id}"));
        }
    }

    let doc_type: DocType = raw
        .doc_type
        .as_deref()
        .ok_or("missing required field: type")?
        .parse()?;

    let ts = match (raw.ts.as_deref(), raw.date.as_deref()) {
        (Some(ts), _) => parse_timestamp(ts)?,
        (None, Some(date)) => parse_timestamp(date)?,
        (None, None) => return Err("missing required field: ts or date".into()),
    };

    let entities = match raw.entities {
        Some(raw_entities) => collect_mentions(raw_entities)?,
        None => Vec::new(),
    };

    Ok(Document {
        id,
        doc_type,
        ts,
        title: raw.title,
        summary: raw.summary,
        tags: raw.tags,
        related_docs: raw
            .related_docs
            .into_iter()
            .map(|r| RelatedDoc {
                id: r.id,
                relationship: r.relationship.unwrap_or_else(|| "related".into()),
            })
            .collect(),
        source_session: raw.source_session,
        source_files: raw.source_files,
        entities,
        body: body.trim().to_string(),
    })
}

/// Accept RFC 3339, a naive `YYYY-MM-DD[T ]HH:MM:SS` (taken as UTC), or a bare date
/// (midnight UTC).
pub fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("unparseable timestamp: {value:?}"))
}

fn collect_mentions(raw: RawEntities) -> std::result::Result<Vec<EntityMention>, String> {
    let pairs: Vec<(String, String)> = match raw {
        RawEntities::Grouped(groups) => groups
            .into_iter()
            .flat_map(|(tag, names)| {
                names
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |name| (name, tag.clone()))
            })
            .collect(),
        RawEntities::Listed(list) => list.into_iter().map(|m| (m.name, m.entity_type)).collect(),
    };

    let mut seen = HashSet::new();
    let mut mentions = Vec::with_capacity(pairs.len());
    for (name, tag) in pairs {
        let entity_type: EntityType = tag.parse()?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(format!("empty {entity_type} name"));
        }
        if seen.insert(name.to_lowercase()) {
            mentions.push(EntityMention { name, entity_type });
        }
    }
    Ok(mentions)
}

#[derive(Serialize)]
struct RenderedFrontMatter<'a> {
    id: String,
    #[serde(rename = "type")]
    doc_type: DocType,
    ts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tags: &'a [String],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    related_docs: &'a [RelatedDoc],
    #[serde(skip_serializing_if = "Option::is_none")]
    source_session: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    source_files: &'a [String],
    entities: BTreeMap<EntityType, Vec<&'a str>>,
}

/// Render a draft as a complete markdown file for the given identifier.
pub fn render_document(id: DocId, draft: &DocumentDraft) -> Result<String> {
    let mut entities: BTreeMap<EntityType, Vec<&str>> = BTreeMap::new();
    for mention in &draft.entities {
        entities
            .entry(mention.entity_type)
            .or_default()
            .push(mention.name.as_str());
    }

    let front = RenderedFrontMatter {
        id: id.to_string(),
        doc_type: draft.doc_type,
        ts: draft.ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        title: draft.title.as_deref(),
        summary: draft.summary.as_deref(),
        tags: &draft.tags,
        related_docs: &draft.related_docs,
        source_session: draft.source_session.as_deref(),
        source_files: &draft.source_files,
        entities,
    };

    let yaml = serde_yaml::to_string(&front)?;
    Ok(format!("---\n{yaml}---\n\n{}\n", draft.body.trim_end()))
}
