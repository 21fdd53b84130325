//! In-memory metadata index with durable snapshot/restore

use crate::types::CacheEntry;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

struct Slot {
    entry: CacheEntry,
    /// Process-local insertion sequence; breaks eviction-order ties
    seq: u64,
}

/// Mapping from logical path to cache entry metadata
///
/// Keeps the running byte total incrementally, so the pair
/// (entries, total) must only ever mutate through this type. Not
/// internally synchronized; the owner serializes access.
#[derive(Default)]
pub struct MetadataIndex {
    entries: HashMap<String, Slot>,
    total_bytes: u64,
    next_seq: u64,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of `size_bytes` across all entries, maintained incrementally
    pub fn total_size(&self) -> u64 {
        self.total_bytes
    }

    /// Insert an entry, replacing any prior entry for the same logical path
    ///
    /// Returns the replaced entry; the caller is responsible for releasing
    /// its stored bytes. Never triggers eviction itself.
    pub fn insert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.total_bytes += entry.size_bytes;
        let replaced = self
            .entries
            .insert(entry.logical_path.clone(), Slot { entry, seq })
            .map(|slot| slot.entry);
        if let Some(old) = &replaced {
            self.total_bytes -= old.size_bytes;
        }
        replaced
    }

    /// Read-only lookup; access stats are mutated only via `record_access`
    pub fn lookup(&self, logical_path: &str) -> Option<&CacheEntry> {
        self.entries.get(logical_path).map(|slot| &slot.entry)
    }

    /// Bump access count and refresh the access time for a hit
    pub fn record_access(
        &mut self,
        logical_path: &str,
        now: DateTime<Utc>,
    ) -> Option<&CacheEntry> {
        let slot = self.entries.get_mut(logical_path)?;
        slot.entry.access_count += 1;
        slot.entry.last_access_time = now;
        Some(&slot.entry)
    }

    /// Delete and return the entry, or `None` if absent
    pub fn remove(&mut self, logical_path: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(logical_path).map(|slot| slot.entry);
        if let Some(entry) = &removed {
            self.total_bytes -= entry.size_bytes;
        }
        removed
    }

    /// Snapshot of all entries sorted ascending by last access time,
    /// ties broken by insertion order, so eviction is deterministic
    pub fn entries_by_last_access_ascending(&self) -> Vec<(String, CacheEntry)> {
        let mut slots: Vec<&Slot> = self.entries.values().collect();
        slots.sort_by_key(|slot| (slot.entry.last_access_time, slot.seq));
        slots
            .into_iter()
            .map(|slot| (slot.entry.logical_path.clone(), slot.entry.clone()))
            .collect()
    }

    /// Top `n` entries by access count descending, ties by insertion order
    pub fn top_accessed(&self, n: usize) -> Vec<(String, u64)> {
        let mut slots: Vec<&Slot> = self.entries.values().collect();
        slots.sort_by_key(|slot| (std::cmp::Reverse(slot.entry.access_count), slot.seq));
        slots
            .into_iter()
            .take(n)
            .map(|slot| (slot.entry.logical_path.clone(), slot.entry.access_count))
            .collect()
    }

    /// Whether any entry stores its bytes under the given key
    ///
    /// Identical content under the same basename shares a storage key
    /// across logical paths, so object deletion must check for other
    /// referents first.
    pub fn references_storage_key(&self, storage_key: &str) -> bool {
        self.entries
            .values()
            .any(|slot| slot.entry.storage_key == storage_key)
    }

    /// Serializable view of the full index, keyed by logical path
    pub fn snapshot(&self) -> BTreeMap<String, CacheEntry> {
        self.entries
            .iter()
            .map(|(path, slot)| (path.clone(), slot.entry.clone()))
            .collect()
    }

    /// Rebuild an index from a snapshot
    ///
    /// Insertion sequences are not persisted, so records are re-inserted
    /// in `(last_access_time, logical_path)` order to keep the restored
    /// eviction order deterministic.
    pub fn restore(records: BTreeMap<String, CacheEntry>) -> Self {
        let mut ordered: Vec<CacheEntry> = records.into_values().collect();
        ordered.sort_by(|a, b| {
            (a.last_access_time, &a.logical_path).cmp(&(b.last_access_time, &b.logical_path))
        });

        let mut index = Self::new();
        for entry in ordered {
            index.insert(entry);
        }
        index
    }
}
