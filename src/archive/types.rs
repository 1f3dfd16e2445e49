//! Closed vocabularies and identifiers shared by the document store and the index.
//!
//! Defines [`EntityType`] (what a mention refers to), [`DocType`] (what kind of
//! document carries it), and [`DocId`] (the `date/sequence` key that maps a
//! document to `log/<date>/<seq>.md`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{IndexError, Result};

/// Category of a canonical entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Project,
    Tool,
    Repo,
    Concept,
    Org,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        Self::Person,
        Self::Project,
        Self::Tool,
        Self::Repo,
        Self::Concept,
        Self::Org,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Project => "project",
            Self::Tool => "tool",
            Self::Repo => "repo",
            Self::Concept => "concept",
            Self::Org => "org",
        }
    }

    /// Parse a type tag, mapping unknown tags to a validation error.
    pub fn parse_tag(tag: &str) -> Result<Self> {
        tag.parse().map_err(IndexError::Validation)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(Self::Person),
            "project" => Ok(Self::Project),
            "tool" => Ok(Self::Tool),
            "repo" => Ok(Self::Repo),
            "concept" => Ok(Self::Concept),
            "org" => Ok(Self::Org),
            _ => Err(format!("unknown entity type: {s}")),
        }
    }
}

/// Kind of archived document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Decision,
    Insight,
    Code,
    Reference,
    Conversation,
    Analysis,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Insight => "insight",
            Self::Code => "code",
            Self::Reference => "reference",
            Self::Conversation => "conversation",
            Self::Analysis => "analysis",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decision" => Ok(Self::Decision),
            "insight" => Ok(Self::Insight),
            "code" => Ok(Self::Code),
            "reference" => Ok(Self::Reference),
            "conversation" => Ok(Self::Conversation),
            "analysis" => Ok(Self::Analysis),
            _ => Err(format!("unknown document type: {s}")),
        }
    }
}

/// Composite document key: a calendar date plus a sequence number within it.
///
/// Ordering is chronological: by date, then by sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId {
    pub date: NaiveDate,
    pub seq: u32,
}

impl DocId {
    pub fn new(date: NaiveDate, seq: u32) -> Result<Self> {
        if seq == 0 || seq > 999 {
            return Err(IndexError::Validation(format!(
                "sequence number out of range (1-999): {seq}"
            )));
        }
        Ok(Self { date, seq })
    }

    /// Path of this document relative to the archive root.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from("log")
            .join(self.date.format("%Y-%m-%d").to_string())
            .join(format!("{:03}.md", self.seq))
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{:03}", self.date.format("%Y-%m-%d"), self.seq)
    }
}

impl std::str::FromStr for DocId {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || IndexError::Validation(format!("malformed document id: {s:?}"));

        let (date, seq) = s.split_once('/').ok_or_else(invalid)?;
        if date.len() != 10 || seq.len() != 3 || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
        let seq: u32 = seq.parse().map_err(|_| invalid())?;
        DocId::new(date, seq).map_err(|_| invalid())
    }
}

impl Serialize for DocId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_round_trips_through_display() {
        let id: DocId = "2025-12-24/003".parse().unwrap();
        assert_eq!(id.date, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
        assert_eq!(id.seq, 3);
        assert_eq!(id.to_string(), "2025-12-24/003");
        assert_eq!(
            id.relative_path(),
            PathBuf::from("log").join("2025-12-24").join("003.md")
        );
    }

    #[test]
    fn doc_id_rejects_malformed_input() {
        for bad in ["", "2025-12-24", "2025-12-24/3", "2025-13-01/001", "2025-12-24/000", "x/001"] {
            let err = bad.parse::<DocId>().unwrap_err();
            assert!(err.is_validation(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn doc_ids_order_by_date_then_sequence() {
        let a: DocId = "2025-12-20/009".parse().unwrap();
        let b: DocId = "2025-12-24/001".parse().unwrap();
        let c: DocId = "2025-12-24/002".parse().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn entity_type_rejects_unknown_tags() {
        assert_eq!(EntityType::parse_tag("repo").unwrap(), EntityType::Repo);
        assert!(EntityType::parse_tag("place").unwrap_err().is_validation());
        assert!(EntityType::parse_tag("Person").is_err());
    }
}
