//! Persistent change store and repository operations for fvh.
//!
//! A repository is a directory containing a reserved `.fvh/` directory with
//! a single JSON metadata document. The document lists the tracked files
//! and every change record ever made, in recording order.
//!
//! All access goes through a [`Repository`] value:
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use fvh_store::Repository;
//!
//! let repo = Repository::init(Path::new(".")).unwrap();
//! repo.add(&[PathBuf::from("notes.txt")]).unwrap();
//! repo.record_change("init").unwrap();
//!
//! let prefix = repo.resolve("notes.txt").unwrap();
//! print!("{}", repo.reconstruct(&prefix).unwrap().to_text());
//! ```
//!
//! Each operation loads the document under a file lock, and mutating
//! operations rewrite it whole before the lock is released.

mod document;
mod lock;
mod report;
mod repository;

pub use document::{MetadataDocument, RepoInfo};
pub use lock::RepoLock;
pub use report::{AddReport, ChangeReport, FileState, FileStatus, RecordedChange};
pub use repository::{CONFIG_FILE, LOCK_FILE, METADATA_FILE, REPO_DIR, Repository};

// Re-export core types for convenience
pub use fvh_core::{
    ChangeId, ChangeRecord, FvhError, LineDelta, LineEdit, LineMap, Prefix, RepoConfig, Result,
    TrackedFile,
};
pub use fvh_engine::DeltaKind;
