//! Database configuration
//!
//! The store root is a directory owned by the engine plus an optional JSON
//! configuration file at a well-known name inside it. A missing file falls
//! back to defaults with a warning; a malformed one is an argument error.

use std::path::Path;

use manifold_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Well-known configuration file name inside the store root.
pub const CONFIG_FILE_NAME: &str = "manifold.json";

/// Value compression applied to collection partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// General-purpose compression is discouraged in favour of
    /// modality-aware encodings, so the default is off.
    #[default]
    None,
    Lz4,
}

impl From<Compression> for fjall::CompressionType {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::None => fjall::CompressionType::None,
            Compression::Lz4 => fjall::CompressionType::Lz4,
        }
    }
}

/// Engine configuration, also the schema of [`CONFIG_FILE_NAME`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Block cache size in bytes.
    pub cache_size_bytes: u64,

    /// Compression for collection partitions.
    pub compression: Compression,

    /// Upper bound on keys returned per key-stream batch.
    pub stream_batch_limit: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            cache_size_bytes: 64 * 1024 * 1024,
            compression: Compression::default(),
            stream_batch_limit: 256,
        }
    }
}

impl DatabaseConfig {
    pub fn with_cache_size(mut self, bytes: u64) -> Self {
        self.cache_size_bytes = bytes;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Load the configuration stored in `root`, if any. Returns the
    /// provided defaults when the file does not exist.
    pub(crate) fn load_from_root(root: &Path, defaults: Self) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "configuration file is missing, defaults will be used");
                return Ok(defaults);
            }
            Err(error) => return Err(error.into()),
        };
        tracing::info!(path = %path.display(), "initializing store from config file");
        serde_json::from_str(&text).map_err(|_| Error::ArgsWrong("couldn't parse the engine config"))
    }
}
