//! Cache orchestration: cacheability policy, writes, reads, stats,
//! and metadata persistence

use crate::config::CacheConfig;
use crate::error::{CacheError, Result, StorageError};
use crate::eviction::EvictionPolicy;
use crate::index::MetadataIndex;
use crate::store::ContentStore;
use crate::types::{CacheEntry, CacheStats};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Structured small-file extensions worth caching (pose data, gripper
/// states, small configs). A whitelist: unknown extensions are never
/// cached even when small.
const CACHEABLE_EXTENSIONS: [&str; 6] = ["json", "yaml", "yml", "csv", "txt", "pkl"];

const OBJECTS_SUBDIR: &str = "small-files";
const METADATA_SUBDIR: &str = "metadata";
const SNAPSHOT_FILE: &str = "cache_metadata.json";

/// Number of entries reported in `CacheStats::most_accessed_files`
const TOP_ACCESSED_COUNT: usize = 5;

/// Size-bounded cache for small structured files
///
/// Owns the content store and the metadata index. The index and its
/// running byte total mutate only under the single write lock, so
/// concurrent callers observe inserts, evictions, and access updates
/// atomically. Store I/O runs outside the lock; an entry only becomes
/// visible after its object write has completed.
pub struct CacheManager {
    store: ContentStore,
    index: RwLock<MetadataIndex>,
    small_file_threshold: u64,
    policy: EvictionPolicy,
    snapshot_path: PathBuf,
}

impl CacheManager {
    /// Create a cache rooted at the configured directory, restoring any
    /// persisted metadata snapshot
    ///
    /// A corrupt snapshot logs a warning and cold-starts an empty cache
    /// rather than failing startup.
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let store = ContentStore::new(config.cache_dir.join(OBJECTS_SUBDIR));
        store.init().await?;

        let metadata_dir = config.cache_dir.join(METADATA_SUBDIR);
        fs::create_dir_all(&metadata_dir)
            .await
            .map_err(|err| CacheError::Storage(StorageError::WriteFailed(err)))?;

        let manager = Self {
            store,
            index: RwLock::new(MetadataIndex::new()),
            small_file_threshold: config.small_file_threshold,
            policy: EvictionPolicy::new(config.cache_size_limit, config.low_water_fraction),
            snapshot_path: metadata_dir.join(SNAPSHOT_FILE),
        };

        if let Err(err) = manager.restore().await {
            warn!(error = %err, "Metadata snapshot unusable, starting with empty cache");
        }

        let entries = manager.index.read().await.len();
        info!(
            cache_dir = ?config.cache_dir,
            threshold_bytes = config.small_file_threshold,
            capacity_bytes = config.cache_size_limit,
            restored_entries = entries,
            "Cache initialized"
        );

        Ok(manager)
    }

    /// Whether a file is worth caching, by size then by extension
    pub fn should_cache(&self, logical_path: &str, size_bytes: u64) -> bool {
        if size_bytes > self.small_file_threshold {
            return false;
        }

        Path::new(logical_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                CACHEABLE_EXTENSIONS.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    /// Cache a file's bytes, returning the storage key
    ///
    /// The object is written (and renamed into place) before the index
    /// entry is made visible, so a failed write leaves no metadata
    /// behind. Replacing a logical path releases the old entry's object
    /// unless another entry still shares it. May trigger an eviction
    /// sweep; the insert and the sweep commit atomically.
    pub async fn cache_file(&self, logical_path: &str, data: &[u8]) -> Result<String> {
        let digest = hex::encode(Sha256::digest(data));
        let content_hash = &digest[..16];
        let basename = Path::new(logical_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unnamed");
        let storage_key = format!("{}_{}", content_hash, basename);

        self.store.put(&storage_key, data).await?;

        let entry = CacheEntry {
            logical_path: logical_path.to_string(),
            size_bytes: data.len() as u64,
            content_hash: content_hash.to_string(),
            access_count: 1,
            last_access_time: Utc::now(),
            storage_key: storage_key.clone(),
        };

        let stale_key = {
            let mut index = self.index.write().await;
            let replaced = index.insert(entry);
            self.policy.enforce(&mut index, &self.store).await;
            replaced
                .map(|old| old.storage_key)
                .filter(|key| *key != storage_key)
                .filter(|key| !index.references_storage_key(key))
        };

        if let Some(key) = stale_key {
            if let Err(err) = self.store.delete(&key).await {
                warn!(key = %key, error = %err, "Failed to delete replaced object");
            }
        }

        debug!(path = %logical_path, key = %storage_key, size = data.len(), "Cached file");
        Ok(storage_key)
    }

    /// Retrieve a file from the cache if present
    ///
    /// A hit bumps the access count and refreshes the access time. An
    /// index entry whose backing object is gone is purged (self-heal)
    /// and reported as a miss; read faults also degrade to a miss. The
    /// read path never returns a hard error.
    pub async fn get_cached_file(&self, logical_path: &str) -> Option<Vec<u8>> {
        let entry = {
            let index = self.index.read().await;
            index.lookup(logical_path).cloned()
        }?;

        if !self.store.exists(&entry.storage_key).await {
            self.self_heal(logical_path, &entry.storage_key).await;
            return None;
        }

        match self.store.get(&entry.storage_key).await {
            Ok(data) => {
                let mut index = self.index.write().await;
                index.record_access(logical_path, Utc::now());
                debug!(path = %logical_path, "Cache hit");
                Some(data)
            }
            Err(StorageError::NotFound(_)) => {
                // Lost a race with out-of-band deletion
                self.self_heal(logical_path, &entry.storage_key).await;
                None
            }
            Err(err) => {
                warn!(path = %logical_path, error = %err, "Failed to read cached object");
                None
            }
        }
    }

    /// Drop a stale index entry whose backing object is missing
    ///
    /// Decrements the running total along with the removal, keeping the
    /// size accounting consistent with the entry set.
    async fn self_heal(&self, logical_path: &str, storage_key: &str) {
        let mut index = self.index.write().await;
        let still_current = index
            .lookup(logical_path)
            .map(|entry| entry.storage_key == storage_key)
            .unwrap_or(false);
        if still_current {
            index.remove(logical_path);
            warn!(
                path = %logical_path,
                key = %storage_key,
                "Cached object missing on disk, removed stale entry"
            );
        }
    }

    /// Current cache statistics; pure read, no mutation
    pub async fn stats(&self) -> CacheStats {
        let index = self.index.read().await;
        let total_cached_files = index.len();
        let current_cache_size_bytes = index.total_size();
        let cache_limit_bytes = self.policy.capacity_limit;

        let cache_utilization_percent = if cache_limit_bytes > 0 {
            current_cache_size_bytes as f64 / cache_limit_bytes as f64 * 100.0
        } else {
            0.0
        };
        let avg_file_size_bytes = if total_cached_files > 0 {
            current_cache_size_bytes as f64 / total_cached_files as f64
        } else {
            0.0
        };

        CacheStats {
            total_cached_files,
            current_cache_size_bytes,
            cache_limit_bytes,
            cache_utilization_percent,
            avg_file_size_bytes,
            most_accessed_files: index.top_accessed(TOP_ACCESSED_COUNT),
        }
    }

    /// Write the metadata snapshot to disk
    ///
    /// The snapshot copy is taken under the lock; serialization and the
    /// disk flush happen outside it.
    pub async fn persist(&self) -> Result<()> {
        let snapshot = {
            let index = self.index.read().await;
            index.snapshot()
        };
        let entries = snapshot.len();

        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| CacheError::MetadataCorrupt(format!("snapshot serialize: {}", err)))?;

        let tmp = self.snapshot_path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .await
            .map_err(|err| CacheError::Storage(StorageError::WriteFailed(err)))?;
        fs::rename(&tmp, &self.snapshot_path)
            .await
            .map_err(|err| CacheError::Storage(StorageError::WriteFailed(err)))?;

        debug!(entries, path = ?self.snapshot_path, "Persisted metadata snapshot");
        Ok(())
    }

    /// Reload the index from the metadata snapshot, replacing the
    /// in-memory state
    ///
    /// A missing snapshot file yields an empty index. A structurally
    /// corrupt file fails with `MetadataCorrupt`; individually malformed
    /// records are skipped with a warning and the rest load.
    pub async fn restore(&self) -> Result<()> {
        let restored = self.load_snapshot().await?;
        let mut index = self.index.write().await;
        *index = restored;
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<MetadataIndex> {
        let raw = match fs::read(&self.snapshot_path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MetadataIndex::new());
            }
            Err(err) => {
                return Err(CacheError::MetadataCorrupt(format!(
                    "snapshot unreadable: {}",
                    err
                )));
            }
        };

        let value: serde_json::Value = serde_json::from_slice(&raw)
            .map_err(|err| CacheError::MetadataCorrupt(format!("snapshot parse: {}", err)))?;
        let records = value
            .as_object()
            .ok_or_else(|| CacheError::MetadataCorrupt("snapshot is not an object".to_string()))?;

        let mut entries: BTreeMap<String, CacheEntry> = BTreeMap::new();
        for (logical_path, record) in records {
            match serde_json::from_value::<CacheEntry>(record.clone()) {
                Ok(entry) => {
                    entries.insert(logical_path.clone(), entry);
                }
                Err(err) => {
                    warn!(
                        path = %logical_path,
                        error = %err,
                        "Skipping malformed metadata record"
                    );
                }
            }
        }

        Ok(MetadataIndex::restore(entries))
    }
}
