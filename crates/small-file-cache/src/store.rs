//! Durable byte storage keyed by storage key

use crate::error::StorageError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// On-disk object store rooted at a dedicated directory
///
/// Objects live flat under the root, named by their storage key. Writes
/// go to a temp file in the same directory and are renamed into place,
/// so a torn write never leaves a visible object.
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Ensure the store directory exists
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(StorageError::WriteFailed)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, storage_key: &str) -> PathBuf {
        self.root.join(storage_key)
    }

    /// Write an object, overwriting any existing one under the same key
    pub async fn put(&self, storage_key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(storage_key);
        let tmp = self.root.join(format!("{}.tmp", storage_key));

        fs::write(&tmp, data)
            .await
            .map_err(StorageError::WriteFailed)?;
        if let Err(err) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::WriteFailed(err));
        }

        debug!(key = %storage_key, size = data.len(), "Stored object");
        Ok(())
    }

    /// Read the full content of an object
    pub async fn get(&self, storage_key: &str) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.object_path(storage_key)).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(err) => Err(StorageError::ReadFailed(err)),
        }
    }

    /// Remove an object; already-absent counts as success
    pub async fn delete(&self, storage_key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.object_path(storage_key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::WriteFailed(err)),
        }
    }

    /// Whether an object exists under the given key; never errors
    pub async fn exists(&self, storage_key: &str) -> bool {
        fs::try_exists(self.object_path(storage_key))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("objects"));
        store.init().await.unwrap();

        store.put("abc_pose.json", b"{\"x\": 1}").await.unwrap();
        let data = store.get("abc_pose.json").await.unwrap();
        assert_eq!(data, b"{\"x\": 1}");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        store.init().await.unwrap();

        store.put("key", b"old").await.unwrap();
        store.put("key", b"new").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        store.init().await.unwrap();

        store.put("key", b"data").await.unwrap();

        let mut names = Vec::new();
        let mut read_dir = fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = read_dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["key".to_string()]);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        store.init().await.unwrap();

        let err = store.get("missing").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(key) if key == "missing"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        store.init().await.unwrap();

        store.put("key", b"data").await.unwrap();
        store.delete("key").await.unwrap();
        // Second delete of an absent object still succeeds
        store.delete("key").await.unwrap();
        assert!(!store.exists("key").await);
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        store.init().await.unwrap();

        assert!(!store.exists("key").await);
        store.put("key", b"data").await.unwrap();
        assert!(store.exists("key").await);
    }
}
