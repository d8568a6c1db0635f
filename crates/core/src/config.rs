//! Snapshot configuration
//!
//! Every option of the snapshot wrapper is an explicit field with a stated
//! default. The same structure can be built in code with the `with_*`
//! setters or loaded from a TOML file:
//!
//! ```toml
//! path = "/data/snapshots/train"
//! compression = "GZIP"
//! shard_size_bytes = 1073741824
//! pending_snapshot_expiry_seconds = 3600
//! ```

use crate::run_types::ExpiryPolicy;
use crate::types::Compression;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Component, Path, PathBuf};

/// Default target uncompressed shard size (10 GiB)
pub const DEFAULT_SHARD_SIZE_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Default age after which an unfinished claim is considered abandoned (1 day)
pub const DEFAULT_PENDING_SNAPSHOT_EXPIRY_SECONDS: i64 = 86_400;

/// Default zstd compression level
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Snapshot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Root directory holding the runs of this pipeline
    pub path: PathBuf,
    /// Per-shard compression (default: none)
    #[serde(default, deserialize_with = "deserialize_compression")]
    pub compression: Compression,
    /// Prefix applied to shard paths when reading
    #[serde(default)]
    pub reader_path_prefix: PathBuf,
    /// Prefix applied to shard paths when writing
    #[serde(default)]
    pub writer_path_prefix: PathBuf,
    /// Target uncompressed bytes per shard
    #[serde(default = "default_shard_size_bytes")]
    pub shard_size_bytes: u64,
    /// Age after which a WRITING claim may be reclaimed; negative disables expiry
    #[serde(default = "default_expiry_seconds")]
    pub pending_snapshot_expiry_seconds: i64,
    /// Compression level when `compression` is zstd
    #[serde(default = "default_zstd_level")]
    pub zstd_level: i32,
}

fn default_shard_size_bytes() -> u64 {
    DEFAULT_SHARD_SIZE_BYTES
}

fn default_expiry_seconds() -> i64 {
    DEFAULT_PENDING_SNAPSHOT_EXPIRY_SECONDS
}

fn default_zstd_level() -> i32 {
    DEFAULT_ZSTD_LEVEL
}

fn deserialize_compression<'de, D>(deserializer: D) -> Result<Compression, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl SnapshotConfig {
    /// Create a config for `path` with every other option at its default
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotConfig {
            path: path.into(),
            compression: Compression::None,
            reader_path_prefix: PathBuf::new(),
            writer_path_prefix: PathBuf::new(),
            shard_size_bytes: DEFAULT_SHARD_SIZE_BYTES,
            pending_snapshot_expiry_seconds: DEFAULT_PENDING_SNAPSHOT_EXPIRY_SECONDS,
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }

    /// Set shard compression
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the prefix used when reading shards
    pub fn with_reader_path_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.reader_path_prefix = prefix.into();
        self
    }

    /// Set the prefix used when writing shards
    pub fn with_writer_path_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.writer_path_prefix = prefix.into();
        self
    }

    /// Set the target shard size
    pub fn with_shard_size_bytes(mut self, bytes: u64) -> Self {
        self.shard_size_bytes = bytes;
        self
    }

    /// Set the pending snapshot expiry (negative disables expiry)
    pub fn with_pending_snapshot_expiry_seconds(mut self, seconds: i64) -> Self {
        self.pending_snapshot_expiry_seconds = seconds;
        self
    }

    /// Set the zstd compression level
    pub fn with_zstd_level(mut self, level: i32) -> Self {
        self.zstd_level = level;
        self
    }

    /// Expiry policy derived from `pending_snapshot_expiry_seconds`
    pub fn expiry(&self) -> ExpiryPolicy {
        ExpiryPolicy::from_seconds(self.pending_snapshot_expiry_seconds)
    }

    /// Root under which shards are read
    pub fn reader_root(&self) -> PathBuf {
        apply_prefix(&self.reader_path_prefix, &self.path)
    }

    /// Root under which shards are written
    pub fn writer_root(&self) -> PathBuf {
        apply_prefix(&self.writer_path_prefix, &self.path)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.shard_size_bytes == 0 {
            return Err(ConfigError::ZeroShardSize);
        }
        if !(1..=22).contains(&self.zstd_level) {
            return Err(ConfigError::InvalidZstdLevel(self.zstd_level));
        }
        Ok(())
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SnapshotConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Returns a commented config file template
    pub fn default_toml() -> &'static str {
        r#"# Snapshot configuration
#
# Root directory for this pipeline's runs (required)
path = "/data/snapshots"

# Per-shard compression: "NONE" (default), "GZIP" or "ZSTD"
compression = "NONE"

# Optional prefixes applied to shard paths when reading / writing
# reader_path_prefix = "/mnt/remote"
# writer_path_prefix = "/scratch"

# Target uncompressed bytes per shard (default 10 GiB)
shard_size_bytes = 10737418240

# Seconds before an unfinished snapshot may be taken over by another worker.
# A negative value means claims never expire.
pending_snapshot_expiry_seconds = 86400
"#
    }
}

/// Join `path` under `prefix`, treating an absolute `path` as relative
fn apply_prefix(prefix: &Path, path: &Path) -> PathBuf {
    if prefix.as_os_str().is_empty() {
        return path.to_path_buf();
    }
    let relative: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    prefix.join(relative)
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No snapshot path given
    #[error("snapshot path must not be empty")]
    EmptyPath,

    /// Shard size of zero
    #[error("shard_size_bytes must be greater than zero")]
    ZeroShardSize,

    /// zstd level out of range
    #[error("zstd_level must be between 1 and 22, got {0}")]
    InvalidZstdLevel(i32),

    /// TOML parse failure
    #[error("invalid config file: {0}")]
    Parse(String),

    /// IO error reading a config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        crate::error::Error::InvalidConfig(e.to_string())
    }
}
