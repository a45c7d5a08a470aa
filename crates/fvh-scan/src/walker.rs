//! JWalk-based collection of the files under a repository root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;

use fvh_core::{FvhError, Result};

/// Collects every regular file below a root, skipping ignored entries.
#[derive(Debug, Clone)]
pub struct FileCollector {
    ignore: Arc<GlobSet>,
    reserved: Arc<Vec<String>>,
}

impl FileCollector {
    /// Create a collector from gitignore-like glob patterns.
    ///
    /// A pattern is matched against both the entry name and its path
    /// relative to the walk root.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| FvhError::config(format!("bad ignore pattern '{pattern}': {e}")))?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| FvhError::config(e.to_string()))?;

        Ok(Self {
            ignore: Arc::new(ignore),
            reserved: Arc::new(Vec::new()),
        })
    }

    /// Never descend into directories with this name.
    pub fn reserve(mut self, dir_name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.reserved).push(dir_name.into());
        self
    }

    /// Walk `root` and return every file found, sorted by path.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root.canonicalize().map_err(|e| FvhError::io(root, e))?;
        if !root.is_dir() {
            return Err(FvhError::io(&root, std::io::Error::other("not a directory")));
        }

        let ignore = Arc::clone(&self.ignore);
        let reserved = Arc::clone(&self.reserved);
        let walk_root = root.clone();

        let walker = WalkDir::new(&root)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .process_read_dir(move |_depth, _dir, _state, children| {
                // Prune here so ignored directories are never entered
                children.retain(|child| match child {
                    Ok(entry) => {
                        let path = entry.path();
                        let relative = path.strip_prefix(&walk_root).unwrap_or(path.as_path());
                        !is_excluded(&ignore, &reserved, relative)
                    }
                    Err(_) => true,
                });
            });

        let mut files = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_file() {
                files.push(entry.path());
            }
        }

        files.sort();
        tracing::debug!(root = %root.display(), count = files.len(), "collected files");
        Ok(files)
    }
}

fn is_excluded(ignore: &GlobSet, reserved: &[String], relative: &Path) -> bool {
    let name_is = |name: &str| {
        relative
            .file_name()
            .is_some_and(|n| n.to_string_lossy() == name)
    };
    if reserved.iter().any(|r| name_is(r)) {
        return true;
    }
    if relative.as_os_str().is_empty() {
        return false;
    }
    let name_match = relative.file_name().is_some_and(|n| ignore.is_match(n));
    name_match || ignore.is_match(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("a.txt"), "a\n").unwrap();
        fs::write(root.join("debug.log"), "noise\n").unwrap();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("src/lib.rs"), "fn x() {}\n").unwrap();
        fs::write(root.join("src/nested/deep.txt"), "deep\n").unwrap();
        fs::create_dir_all(root.join(".fvh")).unwrap();
        fs::write(root.join(".fvh/metadata.json"), "{}").unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("target/debug/out"), "bin").unwrap();

        temp
    }

    fn relative_names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        let root = root.canonicalize().unwrap();
        files
            .iter()
            .map(|f| {
                f.strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_collect_skips_reserved_and_ignored() {
        let temp = create_tree();
        let collector = FileCollector::new(&["*.log".to_string(), "target".to_string()])
            .unwrap()
            .reserve(".fvh");

        let files = collector.collect(temp.path()).unwrap();
        let names = relative_names(temp.path(), &files);

        assert_eq!(names, vec!["a.txt", "src/lib.rs", "src/nested/deep.txt"]);
    }

    #[test]
    fn test_collect_without_patterns() {
        let temp = create_tree();
        let collector = FileCollector::new(&[]).unwrap();
        let files = collector.collect(temp.path()).unwrap();
        assert_eq!(files.len(), 6);
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let err = FileCollector::new(&["a[".to_string()]).unwrap_err();
        assert!(matches!(err, FvhError::InvalidConfig { .. }));
    }

    #[test]
    fn test_is_excluded() {
        let collector = FileCollector::new(&["build/**".to_string()])
            .unwrap()
            .reserve(".fvh");
        let excluded = |p: &str| is_excluded(&collector.ignore, &collector.reserved, Path::new(p));
        assert!(excluded(".fvh"));
        assert!(excluded("build/x.o"));
        assert!(!excluded("src/main.rs"));
    }
}
