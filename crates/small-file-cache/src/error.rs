//! Error types for the small-file cache

use std::fmt;

/// Faults from the on-disk content store
#[derive(Debug)]
pub enum StorageError {
    /// No object exists under the given storage key
    NotFound(String),
    /// Writing an object (or its temp file / rename) failed
    WriteFailed(std::io::Error),
    /// Reading an existing object failed for a reason other than absence
    ReadFailed(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(key) => write!(f, "object not found: {}", key),
            StorageError::WriteFailed(err) => write!(f, "object write failed: {}", err),
            StorageError::ReadFailed(err) => write!(f, "object read failed: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::WriteFailed(err) | StorageError::ReadFailed(err) => Some(err),
            StorageError::NotFound(_) => None,
        }
    }
}

/// Top-level error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// Malformed size/threshold configuration string; fatal at startup
    InvalidSizeFormat(String),
    /// Content store fault surfaced by a cache write
    Storage(StorageError),
    /// Metadata snapshot unreadable or structurally malformed
    MetadataCorrupt(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidSizeFormat(text) => {
                write!(f, "invalid size format: {:?}", text)
            }
            CacheError::Storage(err) => write!(f, "storage error: {}", err),
            CacheError::MetadataCorrupt(msg) => write!(f, "metadata corrupt: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for CacheError {
    fn from(err: StorageError) -> Self {
        CacheError::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
