//! Repository configuration.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{FvhError, Result};

/// Shortest id length accepted for prefixes and change ids.
pub const MIN_ID_LENGTH: usize = 4;
/// Longest id length accepted for prefixes and change ids.
pub const MAX_ID_LENGTH: usize = 64;

/// Per-repository settings, read from `.fvh/config.toml` when present.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct RepoConfig {
    /// Length of generated file prefixes.
    #[builder(default = "8")]
    pub prefix_length: usize,

    /// Length of generated change ids.
    #[builder(default = "16")]
    pub change_id_length: usize,

    /// Append a record even when a file did not change.
    #[builder(default = "true")]
    pub record_empty_changes: bool,

    /// Glob patterns skipped by `add --all`.
    #[builder(default)]
    pub ignore: Vec<String>,
}

fn check_length(name: &str, len: usize) -> std::result::Result<(), String> {
    if !(MIN_ID_LENGTH..=MAX_ID_LENGTH).contains(&len) {
        return Err(format!(
            "{name} must be between {MIN_ID_LENGTH} and {MAX_ID_LENGTH}, got {len}"
        ));
    }
    Ok(())
}

impl RepoConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(len) = self.prefix_length {
            check_length("prefix_length", len)?;
        }
        if let Some(len) = self.change_id_length {
            check_length("change_id_length", len)?;
        }
        Ok(())
    }
}

impl RepoConfig {
    /// Create a new config builder.
    pub fn builder() -> RepoConfigBuilder {
        RepoConfigBuilder::default()
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(FvhError::io(path, e)),
        };

        let config: Self = toml::from_str(&text)
            .map_err(|e| FvhError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| FvhError::config(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| FvhError::io(path, e))
    }

    /// Check the invariants the builder enforces on an already built value.
    pub fn validate(&self) -> Result<()> {
        check_length("prefix_length", self.prefix_length).map_err(FvhError::config)?;
        check_length("change_id_length", self.change_id_length).map_err(FvhError::config)?;
        Ok(())
    }
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            prefix_length: 8,
            change_id_length: 16,
            record_empty_changes: true,
            ignore: Vec::new(),
        }
    }
}
