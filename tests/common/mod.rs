//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
pub use stratacache::{
    Compression, ElementCodec, Error, IterPipeline, ManualClock, Mode, MsgpackCodec,
    Result, RunStatus, Snapshot, SnapshotConfig,
};
use tempfile::TempDir;

/// Fixed-width codec: every element encodes to exactly 8 bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedI64Codec;

impl ElementCodec for FixedI64Codec {
    type Item = i64;

    fn encode(&self, item: &i64) -> Result<Vec<u8>> {
        Ok(item.to_le_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<i64> {
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| Error::element(format!("expected 8 bytes, got {}", bytes.len())))?;
        Ok(i64::from_le_bytes(raw))
    }

    fn codec_id(&self) -> &str {
        "fixed-i64"
    }
}

/// Snapshot directory in a temp dir, with a manual clock
pub struct TestSnapshot {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
}

impl TestSnapshot {
    pub fn new() -> Self {
        TestSnapshot {
            dir: tempfile::tempdir().unwrap(),
            clock: Arc::new(ManualClock::new(1_000_000)),
        }
    }

    /// Root the snapshot config points at
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("snap")
    }

    pub fn config(&self) -> SnapshotConfig {
        SnapshotConfig::new(self.root())
    }

    pub fn open(&self, config: SnapshotConfig) -> Snapshot {
        Snapshot::new(config).unwrap().with_clock(self.clock.clone())
    }
}

/// Drain a stage, panicking on the first error
pub fn drain<T>(stage: impl Iterator<Item = Result<T>>) -> Vec<T> {
    stage.map(|r| r.unwrap()).collect()
}

/// Every file under `dir` with the given extension, recursively
pub fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if !dir.exists() {
        return found;
    }
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            found.extend(files_with_extension(&path, ext));
        } else if path.extension().map_or(false, |e| e == ext) {
            found.push(path);
        }
    }
    found.sort();
    found
}

/// Pipeline over `0..n` as i64
pub fn range_pipeline(
    definition: &str,
    n: i64,
) -> IterPipeline<impl Fn() -> std::ops::Range<i64>> {
    IterPipeline::new(definition, move || 0..n)
}
