//! Core types and traits for fvh.
//!
//! This crate provides the fundamental data structures shared by the fvh
//! crates: line maps and deltas, tracked files, change records, identifiers,
//! configuration and the common error type.

mod config;
mod error;
mod ident;
mod lines;
mod record;

pub use config::{MAX_ID_LENGTH, MIN_ID_LENGTH, RepoConfig, RepoConfigBuilder};
pub use error::{FvhError, Result};
pub use ident::IdGenerator;
pub use lines::{LineDelta, LineEdit, LineMap};
pub use record::{ChangeId, ChangeRecord, ContentHash, ParseHashError, Prefix, TrackedFile};
