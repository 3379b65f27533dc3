//! Filesystem-backed photo store.
//!
//! Photos are addressed by hierarchical string keys (see [`path`]). The
//! store never overwrites: an upload to an existing key is an error, which
//! together with the microsecond key scheme keeps one object per check-in.

pub mod path;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::StorageConfig;

/// Failure kinds surfaced to callers. Callers decide what is retryable;
/// the store only reports what happened.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// A dereferenceable location for one stored photo. Normalizes the
/// public-URL shape at the store boundary so display code never branches
/// on response variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUrl(String);

impl PhotoUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhotoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct PhotoStore {
    root: PathBuf,
    public_base: Option<String>,
}

impl PhotoStore {
    /// Open the store, creating the root directory and verifying it is
    /// listable. A root that cannot be created or read is fatal upstream.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        fs::create_dir_all(&config.root)
            .with_context(|| format!("failed to create photo store at {}", config.root.display()))?;
        fs::read_dir(&config.root)
            .with_context(|| format!("photo store not listable at {}", config.root.display()))?;

        Ok(Self {
            root: config.root.clone(),
            public_base: config
                .public_base_url
                .as_ref()
                .map(|base| base.trim_end_matches('/').to_string()),
        })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.split('/') {
            path.push(segment);
        }
        path
    }

    pub fn exists(&self, key: &str) -> bool {
        self.object_path(key).is_file()
    }

    /// Store bytes under a key. Fails if the key is already taken;
    /// overwrite is never assumed.
    pub fn upload(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(key);
        if path.exists() {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }

    /// All keys under a prefix, sorted. An absent prefix lists as empty.
    pub fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let base = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.object_path(prefix)
        };
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&base).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                keys.push(path_to_key(rel));
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Bulk delete. Keys that are already gone are skipped; the count of
    /// objects actually removed is returned.
    pub fn remove(&self, keys: &[String]) -> Result<usize, StoreError> {
        let mut removed = 0;
        for key in keys {
            let path = self.object_path(key);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    /// Move an object to a new key. Rename first; copy + remove as the
    /// cross-filesystem fallback. Used by the legacy-key migration only.
    pub fn rename(&self, key: &str, new_key: &str) -> Result<(), StoreError> {
        let from = self.object_path(key);
        if !from.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let to = self.object_path(new_key);
        if to.exists() {
            return Err(StoreError::AlreadyExists(new_key.to_string()));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::rename(&from, &to) {
            Ok(()) => Ok(()),
            Err(_) => {
                fs::copy(&from, &to)?;
                fs::remove_file(&from)?;
                Ok(())
            }
        }
    }

    /// Resolve a key to something the display layer can dereference: the
    /// configured public base URL when present, a file URL otherwise.
    pub fn public_url(&self, key: &str) -> PhotoUrl {
        match &self.public_base {
            Some(base) => PhotoUrl(format!("{}/{}", base, key)),
            None => PhotoUrl(format!("file://{}", self.object_path(key).display())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn path_to_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, PhotoStore) {
        let dir = TempDir::new().unwrap();
        let store = PhotoStore::open(&StorageConfig {
            root: dir.path().join("photos"),
            public_base_url: None,
        })
        .unwrap();
        (dir, store)
    }

    #[test]
    fn test_upload_and_exists() {
        let (_dir, store) = test_store();
        store.upload("1/2026-08-07/101500000000.jpg", b"jpeg").unwrap();
        assert!(store.exists("1/2026-08-07/101500000000.jpg"));
        assert!(!store.exists("1/2026-08-07/999999999999.jpg"));
    }

    #[test]
    fn test_upload_refuses_overwrite() {
        let (_dir, store) = test_store();
        store.upload("1/a.jpg", b"first").unwrap();
        match store.upload("1/a.jpg", b"second") {
            Err(StoreError::AlreadyExists(key)) => assert_eq!(key, "1/a.jpg"),
            other => panic!("expected AlreadyExists, got {:?}", other),
        }
    }

    #[test]
    fn test_list_by_prefix() {
        let (_dir, store) = test_store();
        store.upload("1/2026-08-07/a.jpg", b"x").unwrap();
        store.upload("1/2026-08-08/b.jpg", b"x").unwrap();
        store.upload("2/2026-08-07/c.jpg", b"x").unwrap();

        let all = store.list("").unwrap();
        assert_eq!(all.len(), 3);

        let user1 = store.list("1").unwrap();
        assert_eq!(
            user1,
            vec!["1/2026-08-07/a.jpg".to_string(), "1/2026-08-08/b.jpg".to_string()]
        );

        assert!(store.list("9").unwrap().is_empty());
    }

    #[test]
    fn test_remove_counts_and_skips_missing() {
        let (_dir, store) = test_store();
        store.upload("1/a.jpg", b"x").unwrap();
        store.upload("1/b.jpg", b"x").unwrap();

        let removed = store
            .remove(&["1/a.jpg".to_string(), "1/b.jpg".to_string(), "1/gone.jpg".to_string()])
            .unwrap();
        assert_eq!(removed, 2);
        assert!(!store.exists("1/a.jpg"));
    }

    #[test]
    fn test_rename_moves_content() {
        let (_dir, store) = test_store();
        store.upload("legacy.jpg", b"payload").unwrap();
        store.rename("legacy.jpg", "1/2026-08-07/101500000000.jpg").unwrap();

        assert!(!store.exists("legacy.jpg"));
        let moved = store.object_path("1/2026-08-07/101500000000.jpg");
        assert_eq!(fs::read(moved).unwrap(), b"payload");
    }

    #[test]
    fn test_rename_missing_source() {
        let (_dir, store) = test_store();
        assert!(matches!(
            store.rename("missing.jpg", "1/a.jpg"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_public_url_shapes() {
        let dir = TempDir::new().unwrap();
        let file_backed = PhotoStore::open(&StorageConfig {
            root: dir.path().join("photos"),
            public_base_url: None,
        })
        .unwrap();
        assert!(file_backed.public_url("1/a.jpg").as_str().starts_with("file://"));

        let public = PhotoStore::open(&StorageConfig {
            root: dir.path().join("photos"),
            public_base_url: Some("https://cdn.example.com/photos/".to_string()),
        })
        .unwrap();
        assert_eq!(
            public.public_url("1/a.jpg").as_str(),
            "https://cdn.example.com/photos/1/a.jpg"
        );
    }
}
