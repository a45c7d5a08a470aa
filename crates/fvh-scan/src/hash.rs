//! BLAKE3 content fingerprints for registered files.

use std::path::{Path, PathBuf};

use blake3::Hasher;
use rayon::prelude::*;

use fvh_core::{ContentHash, FvhError, Result};

/// Compute the BLAKE3 hash of a file's bytes.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let mut hasher = Hasher::new();
    // Memory-mapped for large files, buffered read otherwise
    hasher
        .update_mmap(path)
        .map_err(|e| FvhError::io(path, e))?;
    Ok(ContentHash::new(*hasher.finalize().as_bytes()))
}

/// Hash several files in parallel, keeping input order.
pub fn hash_files(paths: &[PathBuf]) -> Vec<Result<ContentHash>> {
    paths.par_iter().map(|path| hash_file(path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn hash_bytes(bytes: &[u8]) -> ContentHash {
        ContentHash::new(*blake3::hash(bytes).as_bytes())
    }

    #[test]
    fn test_hash_file_matches_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        fs::write(&path, "alpha\nbeta\n").unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"alpha\nbeta\n"));
    }

    #[test]
    fn test_hash_files_keeps_order_and_errors() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "other").unwrap();

        let results = hash_files(&[a, temp.path().join("missing"), b]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &hash_bytes(b"same"));
        assert!(matches!(results[1], Err(FvhError::FileNotFound { .. })));
        assert_eq!(results[2].as_ref().unwrap(), &hash_bytes(b"other"));
    }

    #[test]
    fn test_empty_file_hash() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty");
        fs::write(&path, "").unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b""));
    }
}
