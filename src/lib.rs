//! StrataCache - transparent on-disk materialization cache for sequential pipelines
//!
//! Wrap a deterministic pipeline in a [`Snapshot`] and iterate the returned
//! stage. The first run writes the elements through to disk; later runs with
//! the same fingerprint replay them without starting the pipeline.
//!
//! # Quick Start
//!
//! ```ignore
//! use stratacache::{IterPipeline, MsgpackCodec, Snapshot, SnapshotConfig};
//!
//! let snapshot = Snapshot::new(SnapshotConfig::new("/data/snapshots/squares"))?;
//! let pipeline = IterPipeline::new("range(1000).map(square)", || (0..1000u64).map(|x| x * x));
//!
//! let total: u64 = snapshot
//!     .apply(&pipeline, MsgpackCodec::<u64>::new())?
//!     .sum::<Result<u64, _>>()?;
//! ```
//!
//! # Architecture
//!
//! - `stratacache-core`: run records, configuration, fingerprints, errors
//! - `stratacache-durability`: metadata store, shard writer and reader
//! - `stratacache-engine`: mode selection and the snapshot stages

pub use stratacache_engine::*;

pub use stratacache_core::{
    Clock, Compression, Error, ExpiryPolicy, Fingerprint, ManualClock, OwnerId, Result,
    RunMetadata, RunStatus, ShardDescriptor, SnapshotConfig, SystemClock,
};
pub use stratacache_durability::{MetadataStore, ShardReader, SnapshotPaths, VerifyReport};
