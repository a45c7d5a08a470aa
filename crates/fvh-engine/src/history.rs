//! Read access to recorded changes.

use fvh_core::{ChangeId, ChangeRecord, Prefix};

/// An ordered source of change records.
///
/// Implementors return records in recording order, which is also the order
/// they are replayed in.
pub trait ChangeHistory {
    /// All records owned by `prefix`, oldest first.
    fn changes_for<'a>(&'a self, prefix: &Prefix) -> Vec<(&'a ChangeId, &'a ChangeRecord)>;

    /// The most recent record owned by `prefix`.
    fn last_change_for<'a>(&'a self, prefix: &Prefix) -> Option<(&'a ChangeId, &'a ChangeRecord)> {
        self.changes_for(prefix).pop()
    }
}

impl ChangeHistory for [(ChangeId, ChangeRecord)] {
    fn changes_for<'a>(&'a self, prefix: &Prefix) -> Vec<(&'a ChangeId, &'a ChangeRecord)> {
        self.iter()
            .filter(|(_, record)| record.belongs_to(prefix))
            .map(|(id, record)| (id, record))
            .collect()
    }

    fn last_change_for<'a>(&'a self, prefix: &Prefix) -> Option<(&'a ChangeId, &'a ChangeRecord)> {
        self.iter()
            .rev()
            .find(|(_, record)| record.belongs_to(prefix))
            .map(|(id, record)| (id, record))
    }
}
