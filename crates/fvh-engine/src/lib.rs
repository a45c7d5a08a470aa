//! Delta and replay algorithms for fvh.
//!
//! Every tracked file owns an ordered list of change records. The first
//! record of a file holds its whole line map; every later record holds only
//! the lines that differ from the replay of the records before it.
//!
//! - [`compute_delta`] diffs a fresh [`LineMap`] against a file's history
//! - [`fold`] replays a file's history into its current [`LineMap`]
//!
//! Both work against any [`ChangeHistory`], so they can run over the
//! persisted metadata document or over an in-memory list of records.
//!
//! ```rust
//! use fvh_core::{ChangeId, ChangeRecord, LineMap, Prefix};
//! use fvh_engine::{compute_delta, fold};
//!
//! let prefix = Prefix::from("notes123");
//! let mut history: Vec<(ChangeId, ChangeRecord)> = Vec::new();
//!
//! let first = compute_delta(history.as_slice(), &prefix, &LineMap::tokenize(b"alpha\nbeta\n"));
//! history.push((ChangeId::from("c1"), ChangeRecord::new(prefix.clone(), "init", first.payload)));
//!
//! let second = compute_delta(history.as_slice(), &prefix, &LineMap::tokenize(b"alpha\nBETA\n"));
//! assert_eq!(second.payload.len(), 1);
//! history.push((ChangeId::from("c2"), ChangeRecord::new(prefix.clone(), "fix", second.payload)));
//!
//! assert_eq!(fold(history.as_slice(), &prefix).to_text(), "alpha\nBETA\n");
//! ```

mod delta;
mod history;
mod replay;

pub use delta::{ComputedDelta, DeltaKind, compute_delta, diff_lines};
pub use history::ChangeHistory;
pub use replay::{fold, fold_records, fold_until};

// Re-export core types
pub use fvh_core::{ChangeId, ChangeRecord, LineDelta, LineEdit, LineMap, Prefix};
