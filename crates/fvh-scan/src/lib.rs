//! File collection and content hashing for fvh.
//!
//! - [`FileCollector`] walks a directory with jwalk and returns every file
//!   that is not excluded by the repository's ignore globs. It backs
//!   `fvh add --all`.
//! - [`hash_file`] / [`hash_files`] compute the BLAKE3 fingerprint stored
//!   for each registered file.
//!
//! ```rust,no_run
//! use fvh_scan::{FileCollector, hash_files};
//!
//! let collector = FileCollector::new(&["target".to_string()]).unwrap().reserve(".fvh");
//! let files = collector.collect(std::path::Path::new(".")).unwrap();
//! for (path, hash) in files.iter().zip(hash_files(&files)) {
//!     println!("{} {}", hash.unwrap(), path.display());
//! }
//! ```

mod hash;
mod walker;

pub use hash::{hash_file, hash_files};
pub use walker::FileCollector;

// Re-export core types for convenience
pub use fvh_core::{ContentHash, FvhError, Result};
