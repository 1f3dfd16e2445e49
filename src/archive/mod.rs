//! The document store: dated markdown files under `log/` that are the source
//! of truth for everything the index contains.

pub mod frontmatter;
pub mod store;
pub mod types;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use store::DocumentStore;
pub use types::{DocId, DocType, EntityType};

/// A name/type pair embedded in a document's front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl EntityMention {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
        }
    }
}

/// A typed link from one document to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedDoc {
    pub id: String,
    pub relationship: String,
}

/// A validated archive document.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub doc_type: DocType,
    /// Timestamp of the document; used as the mention time of every ref.
    pub ts: DateTime<Utc>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub related_docs: Vec<RelatedDoc>,
    pub source_session: Option<String>,
    pub source_files: Vec<String>,
    /// Deduplicated mentions, in front-matter order.
    pub entities: Vec<EntityMention>,
    pub body: String,
}

/// A document not yet written to the store (it has no identifier yet).
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    pub doc_type: DocType,
    pub ts: DateTime<Utc>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub related_docs: Vec<RelatedDoc>,
    pub source_session: Option<String>,
    pub source_files: Vec<String>,
    pub entities: Vec<EntityMention>,
    pub body: String,
}

impl DocumentDraft {
    pub fn new(doc_type: DocType, ts: DateTime<Utc>, body: impl Into<String>) -> Self {
        Self {
            doc_type,
            ts,
            title: None,
            summary: None,
            tags: Vec::new(),
            related_docs: Vec::new(),
            source_session: None,
            source_files: Vec::new(),
            entities: Vec::new(),
            body: body.into(),
        }
    }

    pub fn mention(mut self, name: impl Into<String>, entity_type: EntityType) -> Self {
        self.entities.push(EntityMention::new(name, entity_type));
        self
    }
}

/// A file under `log/` that could not be turned into a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorruptDocument {
    pub path: PathBuf,
    pub reason: String,
}
