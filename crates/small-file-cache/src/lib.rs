//! Size-bounded, content-addressed cache for small robotics data files
//!
//! Sits in front of a bulk object store and keeps small structured files
//! (pose records, gripper states, configs) on local disk with in-memory
//! metadata tracking, LRU eviction against a byte capacity, and a JSON
//! metadata snapshot that survives restarts.

pub mod cache;
pub mod config;
pub mod error;
pub mod eviction;
pub mod index;
pub mod store;
pub mod types;

pub use cache::CacheManager;
pub use config::{parse_size, CacheConfig};
pub use error::{CacheError, Result, StorageError};
pub use eviction::EvictionPolicy;
pub use index::MetadataIndex;
pub use store::ContentStore;
pub use types::{CacheEntry, CacheStats};
