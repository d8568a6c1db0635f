//! Snapshot directory structure
//!
//! Metadata always lives under the unprefixed root so every worker agrees on
//! one record per run. Shards live under the reader or writer root, which is
//! the root with the configured prefix applied:
//!
//! ```text
//! <root>/<fingerprint>/snapshot.metadata
//! <root>/<fingerprint>/snapshot.lock
//! <writer_root>/<fingerprint>/<owner>/NNNNNNNN.snapshot
//! <reader_root>/<fingerprint>/<owner>/NNNNNNNN.snapshot
//! ```

use crate::format::{LOCK_FILE_NAME, METADATA_FILE_NAME};
use std::path::{Path, PathBuf};
use stratacache_core::{Fingerprint, OwnerId, SnapshotConfig};

/// Snapshot directory paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    root: PathBuf,
    reader_root: PathBuf,
    writer_root: PathBuf,
}

impl SnapshotPaths {
    /// Create paths with no reader/writer prefixes
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        SnapshotPaths {
            reader_root: root.clone(),
            writer_root: root.clone(),
            root,
        }
    }

    /// Create paths from a snapshot configuration
    pub fn from_config(config: &SnapshotConfig) -> Self {
        SnapshotPaths {
            root: config.path.clone(),
            reader_root: config.reader_root(),
            writer_root: config.writer_root(),
        }
    }

    /// Get the metadata root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the metadata of a run
    pub fn run_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(fingerprint)
    }

    /// Metadata record of a run
    pub fn metadata_file(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.run_dir(fingerprint).join(METADATA_FILE_NAME)
    }

    /// Lock file of a run
    pub fn lock_file(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.run_dir(fingerprint).join(LOCK_FILE_NAME)
    }

    /// Directory holding every owner's shard directory of a run
    pub fn writer_run_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.writer_root.join(fingerprint)
    }

    /// Directory an owner writes shards into
    pub fn writer_shard_dir(&self, fingerprint: &Fingerprint, owner: &OwnerId) -> PathBuf {
        self.writer_run_dir(fingerprint).join(owner.to_string())
    }

    /// Directory shards of an owner are read from
    pub fn reader_shard_dir(&self, fingerprint: &Fingerprint, owner: &OwnerId) -> PathBuf {
        self.reader_root
            .join(fingerprint)
            .join(owner.to_string())
    }
}
