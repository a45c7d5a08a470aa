//! The persisted metadata document and its change store operations.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use fvh_core::{ChangeId, ChangeRecord, FvhError, Prefix, Result, TrackedFile};
use fvh_engine::ChangeHistory;

/// Repository-level information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// When the repository was initialized.
    pub create: DateTime<Utc>,
}

/// The single durable store of a repository.
///
/// Both tables keep insertion order, and the order of `changes` is the
/// replay order of every file's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    /// Repository information.
    pub info: RepoInfo,
    /// Tracked files keyed by prefix.
    pub add: IndexMap<Prefix, TrackedFile>,
    /// Change records keyed by change id.
    pub changes: IndexMap<ChangeId, ChangeRecord>,
}

impl MetadataDocument {
    /// Create an empty document stamped with the current time.
    pub fn new() -> Self {
        Self {
            info: RepoInfo { create: Utc::now() },
            add: IndexMap::new(),
            changes: IndexMap::new(),
        }
    }

    /// Read a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FvhError::RepositoryNotFound {
                path: path.to_path_buf(),
            },
            _ => FvhError::io(path, e),
        })?;
        serde_json::from_str(&text).map_err(|e| FvhError::malformed(path, e))
    }

    /// Rewrite the whole document.
    ///
    /// The new content goes to a temp file next to `path` which is then
    /// renamed over it, so readers never see a partial document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let json = serde_json::to_string_pretty(self).map_err(|e| FvhError::malformed(path, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FvhError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| FvhError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| FvhError::io(path, e.error))?;
        Ok(())
    }

    /// Register a file under a fresh prefix.
    pub fn register(&mut self, prefix: Prefix, file: TrackedFile) {
        debug_assert!(!self.add.contains_key(&prefix));
        self.add.insert(prefix, file);
    }

    /// Find the prefix a path is tracked under.
    pub fn find_by_path(&self, path: &Path) -> Option<&Prefix> {
        self.add
            .iter()
            .find(|(_, file)| file.path == path)
            .map(|(prefix, _)| prefix)
    }

    /// Check if a prefix names a tracked file.
    pub fn is_tracked(&self, prefix: &Prefix) -> bool {
        self.add.contains_key(prefix)
    }

    /// Append a record under a fresh change id.
    pub fn append(&mut self, id: ChangeId, record: ChangeRecord) {
        debug_assert!(!self.changes.contains_key(&id));
        self.changes.insert(id, record);
    }

    /// Records of one file, in insertion order.
    pub fn list_by_prefix(&self, prefix: &Prefix) -> Vec<(&ChangeId, &ChangeRecord)> {
        self.changes
            .iter()
            .filter(|(_, record)| record.belongs_to(prefix))
            .collect()
    }

    /// The most recent record of one file.
    pub fn last_by_prefix(&self, prefix: &Prefix) -> Option<(&ChangeId, &ChangeRecord)> {
        self.changes
            .iter()
            .rev()
            .find(|(_, record)| record.belongs_to(prefix))
    }
}

impl Default for MetadataDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHistory for MetadataDocument {
    fn changes_for<'a>(&'a self, prefix: &Prefix) -> Vec<(&'a ChangeId, &'a ChangeRecord)> {
        self.list_by_prefix(prefix)
    }

    fn last_change_for<'a>(&'a self, prefix: &Prefix) -> Option<(&'a ChangeId, &'a ChangeRecord)> {
        self.last_by_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvh_core::{ContentHash, LineDelta};
    use tempfile::TempDir;

    fn record(owner: &str, line: &str) -> ChangeRecord {
        let mut payload = LineDelta::new();
        payload.set(1, line);
        ChangeRecord::new(Prefix::from(owner), "test", payload)
    }

    #[test]
    fn test_list_and_last_by_prefix() {
        let mut doc = MetadataDocument::new();
        doc.append(ChangeId::from("c1"), record("aaaa", "1"));
        doc.append(ChangeId::from("c2"), record("bbbb", "x"));
        doc.append(ChangeId::from("c3"), record("aaaa", "2"));

        let a = Prefix::from("aaaa");
        let ids: Vec<&str> = doc.list_by_prefix(&a).iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        assert_eq!(doc.last_by_prefix(&a).unwrap().0.as_str(), "c3");
        assert!(doc.list_by_prefix(&Prefix::from("none")).is_empty());
        assert!(doc.last_by_prefix(&Prefix::from("none")).is_none());
    }

    #[test]
    fn test_save_load_preserves_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("metadata.json");

        let mut doc = MetadataDocument::new();
        doc.register(
            Prefix::from("zzzz"),
            TrackedFile::new("b.txt", ContentHash::new([1; 32])),
        );
        doc.register(
            Prefix::from("aaaa"),
            TrackedFile::new("a.txt", ContentHash::new([2; 32])),
        );
        for (i, id) in ["z9", "a1", "m5"].iter().enumerate() {
            doc.append(ChangeId::from(*id), record("zzzz", &i.to_string()));
        }

        doc.save(&path).unwrap();
        let loaded = MetadataDocument::load(&path).unwrap();

        assert_eq!(loaded, doc);
        let ids: Vec<&str> = loaded.changes.keys().map(ChangeId::as_str).collect();
        assert_eq!(ids, vec!["z9", "a1", "m5"]);
        assert_eq!(
            loaded.find_by_path(Path::new("a.txt")),
            Some(&Prefix::from("aaaa"))
        );
    }

    #[test]
    fn test_load_missing_document() {
        let temp = TempDir::new().unwrap();
        let err = MetadataDocument::load(&temp.path().join("metadata.json")).unwrap_err();
        assert!(matches!(err, FvhError::RepositoryNotFound { .. }));
    }

    #[test]
    fn test_load_malformed_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("metadata.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MetadataDocument::load(&path).unwrap_err(),
            FvhError::MalformedStore { .. }
        ));

        // Valid JSON with the wrong structure
        std::fs::write(&path, r#"{"info": {}, "add": [], "changes": {}}"#).unwrap();
        assert!(matches!(
            MetadataDocument::load(&path).unwrap_err(),
            FvhError::MalformedStore { .. }
        ));
    }

    #[test]
    fn test_document_shape() {
        let mut doc = MetadataDocument::new();
        doc.register(
            Prefix::from("p8211abc"),
            TrackedFile::new("notes.txt", ContentHash::new([0; 32])),
        );
        let value = serde_json::to_value(&doc).unwrap();

        assert!(value["info"]["create"].is_string());
        assert_eq!(value["add"]["p8211abc"]["file"], "notes.txt");
        assert!(value["changes"].as_object().unwrap().is_empty());
    }
}
