//! Record types read from and written to the index tables.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive::{DocId, EntityType};

/// Surrogate identifier of a canonical entity (UUID v7, time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A canonical entity, matching the `entities` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub id: EntityId,
    /// Display name; always registered as an alias of this entity.
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Earliest mention time seen.
    pub created: DateTime<Utc>,
    /// Latest mention time seen; never moves backward.
    pub last_mentioned: DateTime<Utc>,
}

/// An alias row: free text resolving to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub alias: String,
    pub entity_id: EntityId,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

/// A document as seen through its refs: identifier plus mention time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocMention {
    pub doc_id: DocId,
    pub ts: DateTime<Utc>,
}

/// Result of an upsert.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
    pub entity: Entity,
    /// `true` if the entity (and its self-alias) was created by this call.
    pub created: bool,
}

/// An entity with the number of documents referencing it.
#[derive(Debug, Clone, Serialize)]
pub struct EntitySummary {
    #[serde(flatten)]
    pub entity: Entity,
    pub doc_count: u64,
}
