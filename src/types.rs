use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Dense position of a docno in insertion order
pub type DocIdx = u64;

/// Marker returned by batch inverse lookups for unresolved docnos
pub const NOT_FOUND: i64 = -1;

/// Default number of docnos buffered before the builder commits a codec
pub const DEFAULT_MIN_BLOCK_SIZE: usize = 1 << 8;

/// Default number of docnos hashed per batch when building the hash inverse
pub const DEFAULT_HASH_BATCH_SIZE: usize = 10_000;

/// Configuration for building a lookup file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Docnos seeded before a codec is chosen for the current block
    pub min_block_size: usize,
    /// Run the inverse post-pass after the forward blocks are sealed
    pub build_inverse: bool,
    /// Docnos per forward-lookup batch while hashing
    pub hash_batch_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            min_block_size: DEFAULT_MIN_BLOCK_SIZE,
            build_inverse: true,
            hash_batch_size: DEFAULT_HASH_BATCH_SIZE,
        }
    }
}

impl BuildConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut config: BuildConfig = serde_json::from_reader(BufReader::new(file))?;
        config.normalize();
        Ok(config)
    }

    pub fn with_min_block_size(mut self, min_block_size: usize) -> Self {
        self.min_block_size = min_block_size;
        self.normalize();
        self
    }

    pub fn with_inverse(mut self, build_inverse: bool) -> Self {
        self.build_inverse = build_inverse;
        self
    }

    fn normalize(&mut self) {
        self.min_block_size = self.min_block_size.max(1);
        self.hash_batch_size = self.hash_batch_size.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build.json");
        std::fs::write(&path, r#"{"min_block_size": 0, "build_inverse": false}"#).unwrap();

        let config = BuildConfig::from_json_file(&path).unwrap();
        assert_eq!(config.min_block_size, 1);
        assert!(!config.build_inverse);
        assert_eq!(config.hash_batch_size, DEFAULT_HASH_BATCH_SIZE);
    }
}
