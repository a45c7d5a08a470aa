//! Line-indexed file content and sparse line deltas.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FvhError, Result};

/// File content as an ordered mapping of 1-based line number to line text.
///
/// Line text never contains the terminator. A map produced by
/// [`LineMap::tokenize`] always has contiguous keys `1..=len`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineMap(BTreeMap<usize, String>);

impl LineMap {
    /// Create an empty line map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split raw bytes into numbered lines.
    ///
    /// Lines end at `\n`, with an optional preceding `\r`. A trailing
    /// terminator does not produce an empty final line, while an
    /// unterminated final fragment does count as a line. Invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn tokenize(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        text.lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.to_string()))
            .collect()
    }

    /// Read and tokenize a file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| FvhError::io(path, e))?;
        Ok(Self::tokenize(&bytes))
    }

    /// Get the text of a line.
    pub fn get(&self, line: usize) -> Option<&str> {
        self.0.get(&line).map(String::as_str)
    }

    /// Set the text of a line, returning the previous text.
    pub fn insert(&mut self, line: usize, text: impl Into<String>) -> Option<String> {
        self.0.insert(line, text.into())
    }

    /// Remove a line, returning its text.
    pub fn remove(&mut self, line: usize) -> Option<String> {
        self.0.remove(&line)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map has no lines.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(line, text)` pairs in line order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(line, text)| (*line, text.as_str()))
    }

    /// Line numbers in order.
    pub fn line_numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }

    /// Overlay a delta: `Set` overwrites, `Delete` removes.
    pub fn apply(&mut self, delta: &LineDelta) {
        for (line, edit) in delta.iter() {
            match edit {
                LineEdit::Set(text) => {
                    self.0.insert(line, text.clone());
                }
                LineEdit::Delete => {
                    self.0.remove(&line);
                }
            }
        }
    }

    /// Join the lines back into text, one `\n` after every line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for text in self.0.values() {
            out.push_str(text);
            out.push('\n');
        }
        out
    }
}

impl FromIterator<(usize, String)> for LineMap {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(usize, &'a str)> for LineMap {
    fn from_iter<I: IntoIterator<Item = (usize, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(line, text)| (line, text.to_string()))
                .collect(),
        )
    }
}

/// A single edit to one line.
///
/// Serialized as the line text for `Set` and as `null` for `Delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum LineEdit {
    /// The line now has this text.
    Set(String),
    /// The line no longer exists.
    Delete,
}

impl LineEdit {
    /// Check if this edit removes the line.
    pub fn is_delete(&self) -> bool {
        matches!(self, LineEdit::Delete)
    }
}

impl From<Option<String>> for LineEdit {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(text) => LineEdit::Set(text),
            None => LineEdit::Delete,
        }
    }
}

impl From<LineEdit> for Option<String> {
    fn from(edit: LineEdit) -> Self {
        match edit {
            LineEdit::Set(text) => Some(text),
            LineEdit::Delete => None,
        }
    }
}

/// Sparse set of line edits recorded by one change.
///
/// Keys are line numbers and need not be contiguous or start at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineDelta(BTreeMap<usize, LineEdit>);

impl LineDelta {
    /// Create an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// A delta that sets every line of `lines`.
    pub fn baseline(lines: &LineMap) -> Self {
        Self(
            lines
                .iter()
                .map(|(line, text)| (line, LineEdit::Set(text.to_string())))
                .collect(),
        )
    }

    /// Record a new text for a line.
    pub fn set(&mut self, line: usize, text: impl Into<String>) {
        self.0.insert(line, LineEdit::Set(text.into()));
    }

    /// Record the removal of a line.
    pub fn delete(&mut self, line: usize) {
        self.0.insert(line, LineEdit::Delete);
    }

    /// Get the edit for a line.
    pub fn get(&self, line: usize) -> Option<&LineEdit> {
        self.0.get(&line)
    }

    /// Number of edited lines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing was edited.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of `Delete` edits.
    pub fn deleted_count(&self) -> usize {
        self.0.values().filter(|edit| edit.is_delete()).count()
    }

    /// Iterate over `(line, edit)` pairs in line order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LineEdit)> {
        self.0.iter().map(|(line, edit)| (*line, edit))
    }
}

impl FromIterator<(usize, LineEdit)> for LineDelta {
    fn from_iter<I: IntoIterator<Item = (usize, LineEdit)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
