//! Error types for repository operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the fvh crates.
pub type Result<T, E = FvhError> = std::result::Result<T, E>;

/// Errors that can occur while working with a repository.
#[derive(Debug, Error)]
pub enum FvhError {
    /// A repository already exists at the target root.
    #[error("A repository already exists at {path}")]
    RepositoryAlreadyExists { path: PathBuf },

    /// No repository (or no metadata document) was found.
    #[error("No repository found at {path}")]
    RepositoryNotFound { path: PathBuf },

    /// A file to register or diff does not exist on disk.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The metadata document exists but cannot be understood.
    #[error("Malformed metadata document {path}: {message}")]
    MalformedStore { path: PathBuf, message: String },

    /// A prefix or path that names no tracked file.
    #[error("Not a tracked file: {target}")]
    UnknownFile { target: String },

    /// A change id that is unknown or belongs to another file.
    #[error("Unknown change {change} for file {prefix}")]
    UnknownChange { prefix: String, change: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FvhError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a malformed-store error.
    pub fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::MalformedStore {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid-config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
