//! Delta computation between a fresh read and a file's recorded history.

use fvh_core::{LineDelta, LineMap, Prefix};

use crate::history::ChangeHistory;
use crate::replay;

/// Whether a delta is a file's first snapshot or an incremental change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// No prior record existed; the payload holds every line.
    Baseline,
    /// The payload holds only lines that differ from the replayed history.
    Incremental,
}

/// Result of diffing a file against its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedDelta {
    /// How the payload was produced.
    pub kind: DeltaKind,
    /// Line edits to record.
    pub payload: LineDelta,
}

impl ComputedDelta {
    /// Check if the file is unchanged since its last record.
    ///
    /// A baseline of an empty file is also empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Compute what must be recorded for `prefix` given its current content.
///
/// The first record of a file is the whole line map. Afterwards the
/// history is replayed and only differing lines are emitted: `Set` for
/// new or changed lines, `Delete` for lines past the end of the fresh read.
pub fn compute_delta<H>(history: &H, prefix: &Prefix, fresh: &LineMap) -> ComputedDelta
where
    H: ChangeHistory + ?Sized,
{
    if history.last_change_for(prefix).is_none() {
        return ComputedDelta {
            kind: DeltaKind::Baseline,
            payload: LineDelta::baseline(fresh),
        };
    }

    let baseline = replay::fold(history, prefix);
    let payload = diff_lines(&baseline, fresh);

    tracing::trace!(
        prefix = %prefix,
        edited = payload.len(),
        deleted = payload.deleted_count(),
        "computed delta"
    );

    ComputedDelta {
        kind: DeltaKind::Incremental,
        payload,
    }
}

/// Line-number-wise difference turning `old` into `new`.
pub fn diff_lines(old: &LineMap, new: &LineMap) -> LineDelta {
    let mut delta = LineDelta::new();

    for (line, text) in new.iter() {
        if old.get(line) != Some(text) {
            delta.set(line, text);
        }
    }

    for line in old.line_numbers() {
        if new.get(line).is_none() {
            delta.delete(line);
        }
    }

    delta
}
