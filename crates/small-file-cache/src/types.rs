//! Cache record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one cached file, keyed by its logical path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque identifier of the original file; not validated as a real path
    pub logical_path: String,
    /// Byte length of the cached content at insertion time
    pub size_bytes: u64,
    /// First 16 hex characters of the SHA-256 of the content
    pub content_hash: String,
    /// Starts at 1 on insertion, incremented on every successful read
    pub access_count: u64,
    /// Updated on insertion and every successful read; drives eviction order
    pub last_access_time: DateTime<Utc>,
    /// On-disk object name, `{content_hash}_{basename(logical_path)}`
    pub storage_key: String,
}

/// Statistics about the cache
///
/// Consumed by monitoring; field names and semantics are stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_cached_files: usize,
    pub current_cache_size_bytes: u64,
    pub cache_limit_bytes: u64,
    pub cache_utilization_percent: f64,
    pub avg_file_size_bytes: f64,
    /// Top entries by access count descending, ties by insertion order
    pub most_accessed_files: Vec<(String, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_entry_serialization() {
        let entry = CacheEntry {
            logical_path: "episodes/0042/pose.json".to_string(),
            size_bytes: 512,
            content_hash: "0123456789abcdef".to_string(),
            access_count: 3,
            last_access_time: Utc::now(),
            storage_key: "0123456789abcdef_pose.json".to_string(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("episodes/0042/pose.json"));
        assert!(json.contains("512"));

        let deserialized: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.logical_path, entry.logical_path);
        assert_eq!(deserialized.size_bytes, entry.size_bytes);
        assert_eq!(deserialized.access_count, entry.access_count);
        assert_eq!(deserialized.storage_key, entry.storage_key);
    }

    #[test]
    fn test_cache_entry_ignores_unknown_fields() {
        let json = r#"{
            "logical_path": "a.json",
            "size_bytes": 10,
            "content_hash": "deadbeefdeadbeef",
            "access_count": 1,
            "last_access_time": "2026-01-01T00:00:00Z",
            "storage_key": "deadbeefdeadbeef_a.json",
            "some_future_field": true
        }"#;

        let entry: CacheEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.logical_path, "a.json");
        assert_eq!(entry.size_bytes, 10);
    }

    #[test]
    fn test_cache_entry_missing_field_fails() {
        // No storage_key
        let json = r#"{
            "logical_path": "a.json",
            "size_bytes": 10,
            "content_hash": "deadbeefdeadbeef",
            "access_count": 1,
            "last_access_time": "2026-01-01T00:00:00Z"
        }"#;

        assert!(serde_json::from_str::<CacheEntry>(json).is_err());
    }
}
