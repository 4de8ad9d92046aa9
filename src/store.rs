//! File persistence seam
//!
//! Baseline snapshots and CI artifacts go through the [`FileStore`] trait
//! instead of `std::fs` directly, so tests can run against an in-memory
//! store and load-failure paths can be exercised without touching disk.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Minimal filesystem surface needed for snapshot persistence
pub trait FileStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
    fn ensure_dir(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// Default store backed by `std::fs`
#[derive(Debug, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-memory store for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
    dirs: Mutex<HashSet<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file before the code under test runs
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), contents.into());
    }

    /// Contents previously written to `path`, if any
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// All file paths written so far, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path:?} not found")))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.insert(path, contents);
        Ok(())
    }

    fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        self.dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let in_files = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path);
        in_files
            || self
                .dirs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_disk_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = DiskStore;
        let nested = dir.path().join("snapshots");
        let path = nested.join("perf-latest.json");

        store.ensure_dir(&nested).unwrap();
        store.write(&path, "{\"trends\":[]}").unwrap();

        assert!(store.exists(&path));
        assert_eq!(store.read(&path).unwrap(), "{\"trends\":[]}");
    }

    #[test]
    fn test_disk_store_missing_file() {
        let dir = tempdir().unwrap();
        let store = DiskStore;
        let err = store.read(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let path = Path::new("snapshots/perf-latest.json");

        assert!(!store.exists(path));
        store.write(path, "contents").unwrap();
        assert!(store.exists(path));
        assert_eq!(store.read(path).unwrap(), "contents");
        assert_eq!(store.paths(), vec![PathBuf::from(path)]);
    }

    #[test]
    fn test_memory_store_missing_file() {
        let store = MemoryStore::new();
        let err = store.read(Path::new("missing.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
