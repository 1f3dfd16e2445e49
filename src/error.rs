//! Error taxonomy for index and document-store operations.
//!
//! Absence during lookups is not an error: resolvers return `Option`. The
//! variants here are reserved for malformed input, references to records that
//! must exist, and mappings that would become inconsistent.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Malformed input to a mutating call or a malformed query.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity, alias, or document does not exist.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// The operation would make one alias point at two entities.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl IndexError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
