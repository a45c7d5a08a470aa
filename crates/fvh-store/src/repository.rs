//! Repository context: the entry point for every fvh operation.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;

use fvh_core::{
    ChangeId, ChangeRecord, FvhError, IdGenerator, LineMap, Prefix, RepoConfig, Result,
    TrackedFile,
};
use fvh_engine::{DeltaKind, compute_delta, fold, fold_until};
use fvh_scan::{FileCollector, hash_files};

use crate::document::MetadataDocument;
use crate::lock::RepoLock;
use crate::report::{AddReport, ChangeReport, FileState, FileStatus, RecordedChange};

/// Name of the reserved repository directory.
pub const REPO_DIR: &str = ".fvh";
/// Metadata document inside [`REPO_DIR`].
pub const METADATA_FILE: &str = "metadata.json";
/// Optional configuration inside [`REPO_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Lock file inside [`REPO_DIR`].
pub const LOCK_FILE: &str = "lock";

/// An fvh repository rooted at a directory.
///
/// Holds no document state between calls: every operation loads the
/// metadata document under the repository lock, and mutating operations
/// write it back before releasing the lock.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    repo_dir: PathBuf,
    config: RepoConfig,
}

impl Repository {
    /// Initialize a repository in `root` with the default configuration.
    pub fn init(root: &Path) -> Result<Self> {
        Self::init_with_config(root, RepoConfig::default())
    }

    /// Initialize a repository in `root`, writing `config` next to the
    /// metadata document.
    pub fn init_with_config(root: &Path, config: RepoConfig) -> Result<Self> {
        config.validate()?;
        let root = root.canonicalize().map_err(|e| FvhError::io(root, e))?;
        let repo_dir = root.join(REPO_DIR);
        let metadata = repo_dir.join(METADATA_FILE);

        if metadata.exists() {
            return Err(FvhError::RepositoryAlreadyExists { path: root });
        }

        std::fs::create_dir_all(&repo_dir).map_err(|e| FvhError::io(&repo_dir, e))?;
        config.save(&repo_dir.join(CONFIG_FILE))?;
        MetadataDocument::new().save(&metadata)?;

        tracing::info!(root = %root.display(), "initialized repository");
        Ok(Self {
            root,
            repo_dir,
            config,
        })
    }

    /// Open the repository rooted exactly at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|_| FvhError::RepositoryNotFound {
                path: root.to_path_buf(),
            })?;
        let repo_dir = root.join(REPO_DIR);

        if !repo_dir.join(METADATA_FILE).is_file() {
            return Err(FvhError::RepositoryNotFound { path: root });
        }

        let config = RepoConfig::load(&repo_dir.join(CONFIG_FILE))?;
        Ok(Self {
            root,
            repo_dir,
            config,
        })
    }

    /// Open the nearest repository at or above `start`.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = start.canonicalize().map_err(|_| FvhError::RepositoryNotFound {
            path: start.to_path_buf(),
        })?;

        for dir in start.ancestors() {
            if dir.join(REPO_DIR).join(METADATA_FILE).is_file() {
                return Self::open(dir);
            }
        }
        Err(FvhError::RepositoryNotFound { path: start })
    }

    /// Repository root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active configuration.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    fn metadata_path(&self) -> PathBuf {
        self.repo_dir.join(METADATA_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.repo_dir.join(LOCK_FILE)
    }

    /// Load the document under a shared lock.
    pub fn snapshot(&self) -> Result<MetadataDocument> {
        let _lock = RepoLock::shared(&self.lock_path())?;
        MetadataDocument::load(&self.metadata_path())
    }

    /// Read-modify-write the document under an exclusive lock.
    ///
    /// Nothing is written if `f` fails.
    fn update<T>(&self, f: impl FnOnce(&mut MetadataDocument) -> Result<T>) -> Result<T> {
        let _lock = RepoLock::exclusive(&self.lock_path())?;
        let path = self.metadata_path();
        let mut doc = MetadataDocument::load(&path)?;
        let out = f(&mut doc)?;
        doc.save(&path)?;
        Ok(out)
    }

    /// Register files for change tracking.
    ///
    /// Every path must name an existing file; otherwise nothing is
    /// registered. Paths that are already tracked are skipped silently.
    pub fn add(&self, paths: &[PathBuf]) -> Result<AddReport> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for path in paths {
            let stored = self.stored_path(path)?;
            if seen.insert(stored.clone()) {
                candidates.push(stored);
            }
        }

        let report = self.update(|doc| {
            let mut report = AddReport::default();
            let (known, fresh): (Vec<_>, Vec<_>) = candidates
                .into_iter()
                .partition(|stored| doc.find_by_path(stored).is_some());
            report.skipped = known;

            let absolute: Vec<PathBuf> = fresh.iter().map(|p| self.root.join(p)).collect();
            let hashes = hash_files(&absolute);

            let mut ids = IdGenerator::new(&self.config);
            for (stored, hash) in fresh.into_iter().zip(hashes) {
                let hash = hash?;
                let prefix = ids.new_file_prefix(|p| doc.is_tracked(p));
                tracing::debug!(prefix = %prefix, path = %stored.display(), "registered file");
                doc.register(prefix.clone(), TrackedFile::new(stored.clone(), hash));
                report.registered.push((prefix, stored));
            }
            Ok(report)
        })?;

        tracing::info!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            "add complete"
        );
        Ok(report)
    }

    /// Register every file under the root that is not ignored.
    pub fn add_all(&self) -> Result<AddReport> {
        let collector = FileCollector::new(&self.config.ignore)?.reserve(REPO_DIR);
        let files = collector.collect(&self.root)?;
        self.add(&files)
    }

    /// Record one change for every tracked file.
    ///
    /// Each file is read, diffed against the replay of its history and
    /// the delta appended as a new record. An unchanged file still gets an
    /// empty record unless `record_empty_changes` is off.
    pub fn record_change(&self, description: &str) -> Result<ChangeReport> {
        let report = self.update(|doc| {
            let mut report = ChangeReport::default();
            let mut ids = IdGenerator::new(&self.config);
            let timestamp = Utc::now();

            let tracked: Vec<(Prefix, PathBuf)> = doc
                .add
                .iter()
                .map(|(prefix, file)| (prefix.clone(), file.path.clone()))
                .collect();

            for (prefix, path) in tracked {
                let fresh = LineMap::read(&self.root.join(&path))?;
                let delta = compute_delta(&*doc, &prefix, &fresh);

                if delta.is_empty()
                    && delta.kind == DeltaKind::Incremental
                    && !self.config.record_empty_changes
                {
                    tracing::debug!(prefix = %prefix, "unchanged, not recorded");
                    report.unchanged.push((prefix, path));
                    continue;
                }

                let change_id = ids.new_change_id(|id| doc.changes.contains_key(id));
                let lines_deleted = delta.payload.deleted_count();
                let lines_set = delta.payload.len() - lines_deleted;

                tracing::debug!(
                    prefix = %prefix,
                    change = %change_id,
                    lines_set,
                    lines_deleted,
                    "recorded change"
                );

                doc.append(
                    change_id.clone(),
                    ChangeRecord {
                        owner: prefix.clone(),
                        description: description.to_string(),
                        timestamp,
                        payload: delta.payload,
                    },
                );
                report.recorded.push(RecordedChange {
                    change_id,
                    prefix,
                    path,
                    kind: delta.kind,
                    lines_set,
                    lines_deleted,
                });
            }
            Ok(report)
        })?;

        tracing::info!(
            records = report.recorded.len(),
            unchanged = report.unchanged.len(),
            edits = report.total_edits(),
            "change recorded"
        );
        Ok(report)
    }

    /// Replay a file's history into its current line map.
    pub fn reconstruct(&self, prefix: &Prefix) -> Result<LineMap> {
        let doc = self.snapshot()?;
        ensure_tracked(&doc, prefix)?;
        Ok(fold(&doc, prefix))
    }

    /// Replay a file's history up to and including `change`.
    pub fn reconstruct_at(&self, prefix: &Prefix, change: &ChangeId) -> Result<LineMap> {
        let doc = self.snapshot()?;
        ensure_tracked(&doc, prefix)?;
        fold_until(&doc, prefix, change).ok_or_else(|| FvhError::UnknownChange {
            prefix: prefix.to_string(),
            change: change.to_string(),
        })
    }

    /// Resolve a prefix or a tracked path to its prefix.
    ///
    /// Relative paths are taken from the process working directory.
    pub fn resolve(&self, target: &str) -> Result<Prefix> {
        let cwd = std::env::current_dir().map_err(|e| FvhError::io(".", e))?;
        self.resolve_from(target, &cwd)
    }

    /// Resolve a prefix or a tracked path, with relative paths taken from
    /// `cwd`.
    ///
    /// The file does not need to exist anymore: a path that cannot be
    /// canonicalized is normalized lexically before the lookup.
    pub fn resolve_from(&self, target: &str, cwd: &Path) -> Result<Prefix> {
        let doc = self.snapshot()?;
        let as_prefix = Prefix::from(target);
        if doc.is_tracked(&as_prefix) {
            return Ok(as_prefix);
        }

        // Exactly as stored at registration
        let raw = Path::new(target);
        if let Some(prefix) = doc.find_by_path(raw) {
            return Ok(prefix.clone());
        }

        let absolute = absolutize(&cwd.join(raw));
        let stored = match absolute.strip_prefix(&self.root) {
            Ok(relative) => normalize_separators(relative),
            Err(_) => absolute,
        };
        doc.find_by_path(&stored)
            .cloned()
            .ok_or_else(|| FvhError::UnknownFile {
                target: target.to_string(),
            })
    }

    /// Tracked files in registration order.
    pub fn tracked_files(&self) -> Result<Vec<(Prefix, TrackedFile)>> {
        let doc = self.snapshot()?;
        Ok(doc.add.into_iter().collect())
    }

    /// Change records in recording order, optionally limited to one file.
    pub fn history(&self, prefix: Option<&Prefix>) -> Result<Vec<(ChangeId, ChangeRecord)>> {
        let doc = self.snapshot()?;
        match prefix {
            Some(prefix) => {
                ensure_tracked(&doc, prefix)?;
                Ok(doc
                    .list_by_prefix(prefix)
                    .into_iter()
                    .map(|(id, record)| (id.clone(), record.clone()))
                    .collect())
            }
            None => Ok(doc.changes.into_iter().collect()),
        }
    }

    /// Compare every tracked file with the replay of its history.
    pub fn status(&self) -> Result<Vec<FileStatus>> {
        let doc = self.snapshot()?;
        let mut statuses = Vec::with_capacity(doc.add.len());

        for (prefix, file) in &doc.add {
            let change_count = doc.list_by_prefix(prefix).len();
            let state = match LineMap::read(&self.root.join(&file.path)) {
                Err(FvhError::FileNotFound { .. }) => FileState::Missing,
                Err(e) => return Err(e),
                Ok(_) if change_count == 0 => FileState::New,
                Ok(current) if current == fold(&doc, prefix) => FileState::Clean,
                Ok(_) => FileState::Modified,
            };
            statuses.push(FileStatus {
                prefix: prefix.clone(),
                path: file.path.clone(),
                state,
                change_count,
            });
        }
        Ok(statuses)
    }

    /// The path stored for `path`: relative to the root when inside it.
    fn stored_path(&self, path: &Path) -> Result<PathBuf> {
        let absolute = path.canonicalize().map_err(|e| FvhError::io(path, e))?;
        if !absolute.is_file() {
            return Err(FvhError::FileNotFound { path: absolute });
        }
        match absolute.strip_prefix(&self.root) {
            Ok(relative) => Ok(normalize_separators(relative)),
            Err(_) => Ok(absolute),
        }
    }
}

fn ensure_tracked(doc: &MetadataDocument, prefix: &Prefix) -> Result<()> {
    if doc.is_tracked(prefix) {
        Ok(())
    } else {
        Err(FvhError::UnknownFile {
            target: prefix.to_string(),
        })
    }
}

/// Canonical form of `path`, also for files that no longer exist.
///
/// The deepest existing ancestor is canonicalized and the remaining
/// components are appended after resolving `.` and `..` lexically.
fn absolutize(path: &Path) -> PathBuf {
    let lexical = lexical_normalize(path);
    let mut missing = Vec::new();
    let mut current = lexical.as_path();
    loop {
        if let Ok(canonical) = current.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return lexical.clone(),
        }
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join normal components with `/` so stored paths are platform neutral.
fn normalize_separators(path: &Path) -> PathBuf {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    PathBuf::from(parts.join("/"))
}
