//! Run lifecycle store
//!
//! Owns the metadata record of every run under a root and the transitions
//! between states:
//!
//! - `probe`: read-only view of a run (ABSENT / WRITING / DONE)
//! - `claim`: ABSENT or EXPIRED → WRITING, for exactly one owner
//! - `finalize`: the claiming owner's WRITING → DONE with the shard inventory
//!
//! # Atomicity
//!
//! `claim` and `finalize` run while holding an exclusive advisory lock on the
//! run's `snapshot.lock` file. Under the lock the record is read again and
//! replaced with write-fsync-rename. `probe` takes no lock: a rename is atomic,
//! so it always sees a complete record. The OS drops the lock when its holder
//! exits, so a crashed worker never wedges a run.
//!
//! # Leftovers
//!
//! Shards written by an owner whose claim expired, and temporary files of
//! interrupted writes, can never be read. After every successful claim and
//! finalize the store sweeps the run's writer directory under the lock,
//! keeping only the current owner's shards.
//!
//! # Unreadable records
//!
//! A record that cannot be parsed or fails validation is treated as ABSENT
//! and logged at `warn`. The next successful claim overwrites it.

use crate::format::{decode_metadata, encode_metadata, is_temp_file, write_atomic};
use crate::paths::SnapshotPaths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stratacache_core::{
    Clock, Compression, Error, ExpiryPolicy, Fingerprint, OwnerId, Result, RunMetadata, RunStatus,
    ShardDescriptor, SnapshotConfig, SystemClock, DEFAULT_PENDING_SNAPSHOT_EXPIRY_SECONDS,
    DEFAULT_SHARD_SIZE_BYTES,
};
use tracing::{debug, info, warn};

/// Persistent run lifecycle store
#[derive(Debug, Clone)]
pub struct MetadataStore {
    paths: SnapshotPaths,
    expiry: ExpiryPolicy,
    clock: Arc<dyn Clock>,
    compression: Compression,
    shard_size_bytes: u64,
}

/// Held for the duration of a claim or finalize.
///
/// Dropping the guard closes the file, which releases the lock.
struct RunLock {
    _file: File,
}

impl RunLock {
    fn acquire(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(RunLock { _file: file })
    }
}

impl MetadataStore {
    /// Create a store over `root` with default expiry and the system clock
    pub fn new(root: impl AsRef<Path>) -> Self {
        MetadataStore {
            paths: SnapshotPaths::from_root(root),
            expiry: ExpiryPolicy::from_seconds(DEFAULT_PENDING_SNAPSHOT_EXPIRY_SECONDS),
            clock: Arc::new(SystemClock),
            compression: Compression::None,
            shard_size_bytes: DEFAULT_SHARD_SIZE_BYTES,
        }
    }

    /// Create a store for the runs of one snapshot configuration
    pub fn from_config(config: &SnapshotConfig) -> Self {
        MetadataStore {
            paths: SnapshotPaths::from_config(config),
            expiry: config.expiry(),
            clock: Arc::new(SystemClock),
            compression: config.compression,
            shard_size_bytes: config.shard_size_bytes,
        }
    }

    /// Set the expiry policy
    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    /// Set the clock used to age claims
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Directory layout
    pub fn paths(&self) -> &SnapshotPaths {
        &self.paths
    }

    /// Current time according to the store's clock
    pub fn now_secs(&self) -> u64 {
        self.clock.now_secs()
    }

    /// Load the record of a run, if a valid one exists
    pub fn load(&self, fingerprint: &Fingerprint) -> Result<Option<RunMetadata>> {
        let path = self.paths.metadata_file(fingerprint);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        match decode_metadata(&bytes) {
            Ok(metadata) if metadata.fingerprint == *fingerprint => Ok(Some(metadata)),
            Ok(metadata) => {
                warn!(
                    target: "stratacache::store",
                    path = %path.display(),
                    found = %metadata.fingerprint,
                    "Metadata names a different fingerprint, treating run as absent"
                );
                Ok(None)
            }
            Err(reason) => {
                warn!(
                    target: "stratacache::store",
                    path = %path.display(),
                    reason = %reason,
                    "Unreadable snapshot metadata, treating run as absent"
                );
                Ok(None)
            }
        }
    }

    /// Observe the state of a run without changing it
    pub fn probe(&self, fingerprint: &Fingerprint) -> Result<RunStatus> {
        Ok(self.status_of(self.load(fingerprint)?))
    }

    fn status_of(&self, record: Option<RunMetadata>) -> RunStatus {
        match record {
            None => RunStatus::Absent,
            Some(metadata) if metadata.is_done() => RunStatus::Done { metadata },
            Some(metadata) => {
                let age_seconds = metadata.age_seconds(self.now_secs());
                RunStatus::Writing {
                    owner: metadata.owner,
                    age_seconds,
                    expired: self.expiry.is_expired(age_seconds),
                }
            }
        }
    }

    /// Try to become the writer of a run
    ///
    /// Succeeds only if the run is absent or its claim has expired. Returns
    /// `false` when another owner holds a live claim or the run is done.
    pub fn claim(&self, fingerprint: &Fingerprint, owner: OwnerId) -> Result<bool> {
        let run_dir = self.paths.run_dir(fingerprint);
        std::fs::create_dir_all(&run_dir)?;
        let _lock = RunLock::acquire(&self.paths.lock_file(fingerprint))?;

        let status = self.probe(fingerprint)?;
        match &status {
            RunStatus::Absent => {}
            RunStatus::Writing {
                owner: previous,
                age_seconds,
                expired: true,
            } => {
                info!(
                    target: "stratacache::store",
                    fingerprint = %fingerprint,
                    previous_owner = %previous,
                    age_seconds,
                    "Reclaiming expired snapshot"
                );
            }
            _ => {
                debug!(
                    target: "stratacache::store",
                    fingerprint = %fingerprint,
                    owner = %owner,
                    status = %status,
                    "Claim refused"
                );
                return Ok(false);
            }
        }

        let record = RunMetadata::writing(
            fingerprint.clone(),
            owner,
            self.now_secs(),
            self.compression,
            self.shard_size_bytes,
        );
        write_atomic(&self.paths.metadata_file(fingerprint), &encode_metadata(&record)?)?;

        info!(
            target: "stratacache::store",
            fingerprint = %fingerprint,
            owner = %owner,
            "Claimed snapshot"
        );
        self.sweep(fingerprint, &owner);
        Ok(true)
    }

    /// Mark a claimed run complete with its shard inventory
    ///
    /// Fails with `Error::ClaimLost` unless the stored record is still
    /// `owner`'s WRITING claim.
    pub fn finalize(
        &self,
        fingerprint: &Fingerprint,
        owner: OwnerId,
        shards: Vec<ShardDescriptor>,
    ) -> Result<RunMetadata> {
        let run_dir = self.paths.run_dir(fingerprint);
        if !run_dir.is_dir() {
            return Err(Error::ClaimLost {
                fingerprint: fingerprint.clone(),
                owner,
            });
        }
        let _lock = RunLock::acquire(&self.paths.lock_file(fingerprint))?;

        let record = match self.load(fingerprint)? {
            Some(record) if record.is_writing() && record.owner == owner => record,
            _ => {
                warn!(
                    target: "stratacache::store",
                    fingerprint = %fingerprint,
                    owner = %owner,
                    "Claim lost before finalize"
                );
                return Err(Error::ClaimLost {
                    fingerprint: fingerprint.clone(),
                    owner,
                });
            }
        };

        let done = record.into_done(shards, self.now_secs());
        done.validate().map_err(Error::metadata)?;
        write_atomic(&self.paths.metadata_file(fingerprint), &encode_metadata(&done)?)?;

        info!(
            target: "stratacache::store",
            fingerprint = %fingerprint,
            owner = %owner,
            shards = done.shards().len(),
            elements = done.element_count().unwrap_or(0),
            "Finalized snapshot"
        );
        self.sweep(fingerprint, &owner);
        Ok(done)
    }

    // Caller holds the run lock.
    fn sweep(&self, fingerprint: &Fingerprint, keep: &OwnerId) {
        let run_dir = self.paths.run_dir(fingerprint);
        let writer_run_dir = self.paths.writer_run_dir(fingerprint);
        remove_temp_files(&run_dir);
        if writer_run_dir != run_dir {
            remove_temp_files(&writer_run_dir);
        }

        for dir in owner_dirs(&writer_run_dir) {
            let Some(owner) = dir
                .file_name()
                .and_then(|name| OwnerId::from_string(&name.to_string_lossy()))
            else {
                continue;
            };
            if owner == *keep {
                remove_temp_files(&dir);
                continue;
            }
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {
                    info!(
                        target: "stratacache::store",
                        fingerprint = %fingerprint,
                        owner = %owner,
                        "Removed abandoned shards"
                    );
                }
                Err(e) if is_missing(&e) => {}
                Err(e) => warn!(
                    target: "stratacache::store",
                    path = %dir.display(),
                    error = %e,
                    "Failed to remove abandoned shards"
                ),
            }
        }
    }

    /// List every run under the root with its probed state
    ///
    /// Entries whose names are not fingerprints are skipped. A missing root
    /// yields an empty list.
    pub fn list_runs(&self) -> Result<Vec<(Fingerprint, RunStatus)>> {
        let entries = match std::fs::read_dir(self.paths.root()) {
            Ok(entries) => entries,
            Err(e) if is_missing(&e) => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(fingerprint) = Fingerprint::parse(&name.to_string_lossy()) else {
                continue;
            };
            let status = self.probe(&fingerprint)?;
            runs.push((fingerprint, status));
        }
        runs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(runs)
    }
}

fn is_missing(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound
}

fn read_dir_logged(dir: &Path) -> Vec<std::fs::DirEntry> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|entry| entry.ok()).collect(),
        Err(e) if is_missing(&e) => Vec::new(),
        Err(e) => {
            warn!(
                target: "stratacache::store",
                path = %dir.display(),
                error = %e,
                "Failed to scan run directory"
            );
            Vec::new()
        }
    }
}

fn owner_dirs(dir: &Path) -> Vec<PathBuf> {
    read_dir_logged(dir)
        .into_iter()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect()
}

fn remove_temp_files(dir: &Path) {
    for entry in read_dir_logged(dir) {
        if !is_temp_file(&entry.file_name().to_string_lossy()) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(
                    target: "stratacache::store",
                    path = %entry.path().display(),
                    "Removed temporary file"
                );
            }
            Err(e) if is_missing(&e) => {}
            Err(e) => warn!(
                target: "stratacache::store",
                path = %entry.path().display(),
                error = %e,
                "Failed to remove temporary file"
            ),
        }
    }
}
