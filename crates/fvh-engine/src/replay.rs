//! Replay of recorded changes into a file's line map.

use fvh_core::{ChangeId, ChangeRecord, LineMap, Prefix};

use crate::history::ChangeHistory;

/// Fold every record of `prefix`, in recording order, into a line map.
///
/// Starts from an empty map; later records win on line collisions.
pub fn fold<H>(history: &H, prefix: &Prefix) -> LineMap
where
    H: ChangeHistory + ?Sized,
{
    fold_records(history.changes_for(prefix).into_iter().map(|(_, record)| record))
}

/// Fold the records of `prefix` up to and including `until`.
///
/// Returns `None` if `until` is not one of the file's records.
pub fn fold_until<H>(history: &H, prefix: &Prefix, until: &ChangeId) -> Option<LineMap>
where
    H: ChangeHistory + ?Sized,
{
    let changes = history.changes_for(prefix);
    let end = changes.iter().position(|(id, _)| *id == until)?;
    Some(fold_records(
        changes[..=end].iter().map(|(_, record)| *record),
    ))
}

/// Fold an explicit sequence of records, in the order given.
pub fn fold_records<'a, I>(records: I) -> LineMap
where
    I: IntoIterator<Item = &'a ChangeRecord>,
{
    let mut lines = LineMap::new();
    for record in records {
        lines.apply(&record.payload);
    }
    lines
}
