//! Cache configuration parsed from environment variables

use crate::error::{CacheError, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_THRESHOLD: u64 = 1_048_576; // 1MB
const DEFAULT_CACHE_SIZE: &str = "1GB";
const DEFAULT_LOW_WATER_FRACTION: f64 = 0.8;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Root directory holding stored objects and the metadata snapshot
    pub cache_dir: PathBuf,
    /// Maximum size of an individual cacheable file, in bytes
    pub small_file_threshold: u64,
    /// Maximum total bytes held by the cache
    pub cache_size_limit: u64,
    /// Fraction of the capacity eviction sweeps down to
    pub low_water_fraction: f64,
}

impl CacheConfig {
    /// Parse configuration from environment variables
    ///
    /// Defaults: `CACHE_DIR=./cache`, `SMALL_FILE_THRESHOLD=1048576`,
    /// `CACHE_SIZE=1GB`. A variable that is present but malformed is a
    /// startup failure, not a silent default.
    pub fn from_env() -> Result<Self> {
        let cache_dir = env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./cache"));

        let small_file_threshold = match env::var("SMALL_FILE_THRESHOLD") {
            Ok(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| CacheError::InvalidSizeFormat(s))?,
            Err(_) => DEFAULT_THRESHOLD,
        };

        let cache_size_limit = match env::var("CACHE_SIZE") {
            Ok(s) => parse_size(&s)?,
            Err(_) => parse_size(DEFAULT_CACHE_SIZE)?,
        };

        Ok(Self {
            cache_dir,
            small_file_threshold,
            cache_size_limit,
            low_water_fraction: DEFAULT_LOW_WATER_FRACTION,
        })
    }
}

/// Parse a human-readable size string like "1GB" into a byte count
///
/// Accepts a numeric prefix followed by `B`, `KB`, `MB`, or `GB`
/// (case-insensitive), or a bare integer byte count.
pub fn parse_size(text: &str) -> Result<u64> {
    let upper = text.trim().to_uppercase();

    // Longest suffix first so "1KB" binds to KB, not B.
    const UNITS: [(&str, u64); 4] = [
        ("KB", 1024),
        ("MB", 1024 * 1024),
        ("GB", 1024 * 1024 * 1024),
        ("B", 1),
    ];

    for (suffix, multiplier) in UNITS {
        if let Some(prefix) = upper.strip_suffix(suffix) {
            let value = prefix
                .trim()
                .parse::<u64>()
                .map_err(|_| CacheError::InvalidSizeFormat(text.to_string()))?;
            return value
                .checked_mul(multiplier)
                .ok_or_else(|| CacheError::InvalidSizeFormat(text.to_string()));
        }
    }

    upper
        .parse::<u64>()
        .map_err(|_| CacheError::InvalidSizeFormat(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("512B").unwrap(), 512);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_case_insensitive() {
        assert_eq!(parse_size("1gb").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("10Mb").unwrap(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_bare_integer() {
        assert_eq!(parse_size("1048576").unwrap(), 1_048_576);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(matches!(
            parse_size("lots"),
            Err(CacheError::InvalidSizeFormat(_))
        ));
        assert!(matches!(
            parse_size("12TB"),
            Err(CacheError::InvalidSizeFormat(_))
        ));
        assert!(matches!(
            parse_size(""),
            Err(CacheError::InvalidSizeFormat(_))
        ));
        assert!(matches!(
            parse_size("-5MB"),
            Err(CacheError::InvalidSizeFormat(_))
        ));
    }
}
