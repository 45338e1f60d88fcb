//! Artifact stores: key -> bytes lookups

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

/// Named binary blobs the trained artifacts are read from
pub trait ArtifactStore: Send + Sync {
    /// Read the full contents of an artifact. A missing artifact is
    /// reported with [`io::ErrorKind::NotFound`].
    fn fetch(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Where the store reads from, for logs
    fn describe(&self) -> String;
}

/// Artifacts stored as files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let plain = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact name `{}` must be a relative path inside the store", name),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl ArtifactStore for DirectoryStore {
    fn fetch(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(name)?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-process artifact store
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.write().insert(name.into(), bytes.into());
    }

    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.write().remove(name)
    }

    // Every write is a single map operation, so a poisoned map is still whole
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArtifactStore for MemoryStore {
    fn fetch(&self, name: &str) -> io::Result<Vec<u8>> {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        blobs.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no artifact named `{}`", name))
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_store_reads_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("feature_columns.json"), b"[\"a\"]").unwrap();

        let store = DirectoryStore::new(temp_dir.path());
        assert_eq!(store.fetch("feature_columns.json").unwrap(), b"[\"a\"]");

        let err = store.fetch("scaler.json").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_directory_store_rejects_escaping_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(temp_dir.path());

        for name in ["../secret", "/etc/passwd", ""] {
            let err = store.fetch(name).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "name {:?}", name);
        }
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new().with("model.json", b"{}".to_vec());
        assert_eq!(store.fetch("model.json").unwrap(), b"{}");

        store.remove("model.json");
        assert_eq!(
            store.fetch("model.json").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_memory_store_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryStore::new().with("model.json", b"{}".to_vec()));

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.blobs.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(store.blobs.is_poisoned());

        store.insert("scaler.json", b"{}".to_vec());
        assert_eq!(store.fetch("scaler.json").unwrap(), b"{}");
        assert_eq!(store.fetch("model.json").unwrap(), b"{}");
        assert!(store.remove("model.json").is_some());
    }
}
