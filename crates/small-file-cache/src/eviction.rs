//! LRU eviction against a byte capacity

use crate::index::MetadataIndex;
use crate::store::ContentStore;
use tracing::{debug, warn};

/// Capacity enforcement over a metadata index and its content store
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    pub capacity_limit: u64,
    /// Fraction of capacity a sweep drives utilization down to
    pub low_water_fraction: f64,
}

impl EvictionPolicy {
    pub fn new(capacity_limit: u64, low_water_fraction: f64) -> Self {
        Self {
            capacity_limit,
            low_water_fraction,
        }
    }

    fn low_water_bytes(&self) -> u64 {
        (self.capacity_limit as f64 * self.low_water_fraction) as u64
    }

    /// Evict least-recently-used entries until utilization falls to the
    /// low-water mark
    ///
    /// No-op while total size is at or under the capacity limit. Store
    /// deletes are best-effort; a delete failure is logged and the entry
    /// is removed from the index regardless, so an evicted entry is never
    /// re-reported as cached. Stops early if the index empties (a single
    /// entry can legitimately exceed the low-water mark). Returns the
    /// number of entries evicted.
    pub async fn enforce(&self, index: &mut MetadataIndex, store: &ContentStore) -> usize {
        if index.total_size() <= self.capacity_limit {
            return 0;
        }

        let low_water = self.low_water_bytes();
        let mut evicted = 0;

        for (logical_path, entry) in index.entries_by_last_access_ascending() {
            if index.total_size() <= low_water {
                break;
            }

            if let Err(err) = store.delete(&entry.storage_key).await {
                warn!(
                    path = %logical_path,
                    key = %entry.storage_key,
                    error = %err,
                    "Failed to delete evicted object, dropping index entry anyway"
                );
            }
            index.remove(&logical_path);
            evicted += 1;
            debug!(path = %logical_path, size = entry.size_bytes, "Evicted from cache");
        }

        evicted
    }
}
