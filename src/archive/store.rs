//! Filesystem access to the archive: `log/<date>/<seq>.md` documents plus the
//! `buffer/` directory of pending transcripts.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use walkdir::WalkDir;

use super::frontmatter::{parse_document, render_document};
use super::types::DocId;
use super::{CorruptDocument, Document, DocumentDraft};
use crate::error::{IndexError, Result};

/// A markdown file found under `log/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    /// A file at a well-formed `log/<date>/<seq>.md` path.
    Document { id: DocId, path: PathBuf },
    /// A markdown file whose location does not encode a document identifier.
    Stray { path: PathBuf },
}

impl ScanEntry {
    pub fn path(&self) -> &Path {
        match self {
            Self::Document { path, .. } | Self::Stray { path } => path,
        }
    }
}

/// Handle on an archive root (the directory containing `log/` and `buffer/`).
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    pub fn buffer_dir(&self) -> PathBuf {
        self.root.join("buffer")
    }

    pub fn path_of(&self, id: DocId) -> PathBuf {
        self.root.join(id.relative_path())
    }

    /// Enumerate every markdown file under `log/`, documents first in
    /// chronological identifier order, then stray files by path.
    ///
    /// A missing `log/` directory is an empty archive.
    pub fn scan(&self) -> Result<Vec<ScanEntry>> {
        let log_dir = self.log_dir();
        if !log_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        let mut strays = Vec::new();

        for entry in WalkDir::new(&log_dir).min_depth(1).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            match id_from_path(&log_dir, &path) {
                Some(id) => documents.push((id, path)),
                None => strays.push(path),
            }
        }

        documents.sort_by(|a, b| a.0.cmp(&b.0));
        strays.sort();

        Ok(documents
            .into_iter()
            .map(|(id, path)| ScanEntry::Document { id, path })
            .chain(strays.into_iter().map(|path| ScanEntry::Stray { path }))
            .collect())
    }

    /// Identifiers of every well-formed document path, oldest first.
    pub fn list_ids(&self) -> Result<Vec<DocId>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter_map(|entry| match entry {
                ScanEntry::Document { id, .. } => Some(id),
                ScanEntry::Stray { .. } => None,
            })
            .collect())
    }

    /// Read and validate a document, reporting any failure as corruption.
    pub fn read_document(&self, id: DocId) -> std::result::Result<Document, CorruptDocument> {
        let path = self.path_of(id);
        let corrupt = |reason: String| CorruptDocument {
            path: path.clone(),
            reason,
        };
        let content = std::fs::read_to_string(&path).map_err(|e| corrupt(format!("unreadable: {e}")))?;
        parse_document(id, &content).map_err(corrupt)
    }

    /// Load a document that is expected to exist and be valid.
    pub fn load(&self, id: DocId) -> Result<Document> {
        if !self.path_of(id).is_file() {
            return Err(IndexError::not_found("document", id.to_string()));
        }
        self.read_document(id)
            .map_err(|c| IndexError::Validation(format!("document {id} is corrupt: {}", c.reason)))
    }

    /// Raw file content, or `None` if the document does not exist.
    pub fn read_content(&self, id: DocId) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_of(id)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a new document under the next free sequence number for its date.
    ///
    /// Uses an atomic write (tmp + rename) so a crash never leaves a half-written
    /// document for the next rebuild to trip over.
    pub fn write(&self, draft: &DocumentDraft) -> Result<DocId> {
        let date = draft.ts.date_naive();
        let id = DocId::new(date, self.next_seq(date)?)?;
        let path = self.path_of(id);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let text = render_document(id, draft)?;
        let tmp_path = path.with_extension("md.tmp");
        std::fs::write(&tmp_path, text)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::debug!(doc_id = %id, path = %path.display(), "document written");
        Ok(id)
    }

    /// Delete a document file.
    pub fn delete(&self, id: DocId) -> Result<()> {
        let path = self.path_of(id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IndexError::not_found("document", id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Number of raw transcripts waiting in `buffer/` for distillation.
    pub fn pending_buffer_count(&self) -> Result<usize> {
        let dir = self.buffer_dir();
        if !dir.is_dir() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt") {
                count += 1;
            }
        }
        Ok(count)
    }

    fn next_seq(&self, date: NaiveDate) -> Result<u32> {
        let day_dir = self.log_dir().join(date.format("%Y-%m-%d").to_string());
        if !day_dir.is_dir() {
            return Ok(1);
        }
        let mut max_seq = 0;
        for entry in std::fs::read_dir(day_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let seq = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);
            max_seq = max_seq.max(seq);
        }
        Ok(max_seq + 1)
    }
}

/// Recover a [`DocId`] from `log/<date>/<seq>.md`.
fn id_from_path(log_dir: &Path, path: &Path) -> Option<DocId> {
    let relative = path.strip_prefix(log_dir).ok()?;
    let mut components = relative.components();
    let date = components.next()?.as_os_str().to_str()?;
    let file = components.next()?.as_os_str().to_str()?;
    if components.next().is_some() {
        return None;
    }
    let seq = file.strip_suffix(".md")?;
    format!("{date}/{seq}").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::types::{DocType, EntityType};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn draft(day: u32) -> DocumentDraft {
        DocumentDraft::new(
            DocType::Decision,
            Utc.with_ymd_and_hms(2025, 12, day, 12, 0, 0).unwrap(),
            "body",
        )
        .mention("Sam", EntityType::Person)
    }

    #[test]
    fn write_allocates_sequential_ids() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path());

        let a = store.write(&draft(24)).unwrap();
        let b = store.write(&draft(24)).unwrap();
        let c = store.write(&draft(20)).unwrap();

        assert_eq!(a.to_string(), "2025-12-24/001");
        assert_eq!(b.to_string(), "2025-12-24/002");
        assert_eq!(c.to_string(), "2025-12-20/001");
        assert!(store.path_of(b).is_file());
        assert_eq!(store.list_ids().unwrap(), vec![c, a, b]);
    }

    #[test]
    fn scan_separates_strays() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path());
        store.write(&draft(24)).unwrap();
        std::fs::write(store.log_dir().join("README.md"), "notes").unwrap();
        std::fs::write(store.log_dir().join("2025-12-24").join("draft.md"), "wip").unwrap();

        let entries = store.scan().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0], ScanEntry::Document { .. }));
        assert!(matches!(entries[1], ScanEntry::Stray { .. }));
        assert!(matches!(entries[2], ScanEntry::Stray { .. }));
    }

    #[test]
    fn missing_log_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path().join("nowhere"));
        assert!(store.scan().unwrap().is_empty());
        assert_eq!(store.pending_buffer_count().unwrap(), 0);
    }

    #[test]
    fn load_and_delete_report_missing_documents() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path());
        let id = store.write(&draft(24)).unwrap();

        let doc = store.load(id).unwrap();
        assert_eq!(doc.entities[0].name, "Sam");

        store.delete(id).unwrap();
        assert!(store.load(id).unwrap_err().is_not_found());
        assert!(store.delete(id).unwrap_err().is_not_found());
        assert!(store.read_content(id).unwrap().is_none());
    }

    #[test]
    fn counts_pending_buffer_files() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path());
        std::fs::create_dir_all(store.buffer_dir()).unwrap();
        std::fs::write(store.buffer_dir().join("20251224-1030.txt"), "USER: hi").unwrap();
        std::fs::write(store.buffer_dir().join(".state"), "x").unwrap();
        assert_eq!(store.pending_buffer_count().unwrap(), 1);
    }
}
