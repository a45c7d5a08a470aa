//! Results returned by repository operations.

use std::path::PathBuf;

use fvh_core::{ChangeId, Prefix};
use fvh_engine::DeltaKind;

/// Outcome of registering files.
#[derive(Debug, Clone, Default)]
pub struct AddReport {
    /// Newly tracked files with their prefixes.
    pub registered: Vec<(Prefix, PathBuf)>,
    /// Paths that were already tracked and left as they were.
    pub skipped: Vec<PathBuf>,
}

impl AddReport {
    /// Check if no new file was registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

/// One record appended by a change operation.
#[derive(Debug, Clone)]
pub struct RecordedChange {
    /// Id of the new record.
    pub change_id: ChangeId,
    /// File the record belongs to.
    pub prefix: Prefix,
    /// Path of that file.
    pub path: PathBuf,
    /// Whether this was the file's first record.
    pub kind: DeltaKind,
    /// Lines set by the record.
    pub lines_set: usize,
    /// Lines removed by the record.
    pub lines_deleted: usize,
}

impl RecordedChange {
    /// Check if the record carries no edits.
    pub fn is_empty(&self) -> bool {
        self.lines_set == 0 && self.lines_deleted == 0
    }
}

/// Outcome of recording a change across all tracked files.
#[derive(Debug, Clone, Default)]
pub struct ChangeReport {
    /// Records that were appended, in append order.
    pub recorded: Vec<RecordedChange>,
    /// Files skipped because nothing changed and empty records are disabled.
    pub unchanged: Vec<(Prefix, PathBuf)>,
}

impl ChangeReport {
    /// Total number of edited lines across all records.
    pub fn total_edits(&self) -> usize {
        self.recorded
            .iter()
            .map(|r| r.lines_set + r.lines_deleted)
            .sum()
    }
}

/// How a tracked file compares with the replay of its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Tracked but no change recorded yet.
    New,
    /// Content equals the replay of its history.
    Clean,
    /// Content differs from the replay of its history.
    Modified,
    /// The file is no longer on disk.
    Missing,
}

impl FileState {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Clean => "clean",
            Self::Modified => "modified",
            Self::Missing => "missing",
        }
    }
}

/// Status line for one tracked file.
#[derive(Debug, Clone)]
pub struct FileStatus {
    /// File prefix.
    pub prefix: Prefix,
    /// Path as stored at registration.
    pub path: PathBuf,
    /// Comparison result.
    pub state: FileState,
    /// Number of recorded changes.
    pub change_count: usize,
}
