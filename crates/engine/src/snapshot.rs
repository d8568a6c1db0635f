//! Snapshot entry point
//!
//! `Snapshot` wraps a pipeline with the materialization cache:
//!
//! ```ignore
//! use stratacache_engine::{IterPipeline, MsgpackCodec, Snapshot};
//! use stratacache_core::SnapshotConfig;
//!
//! let snapshot = Snapshot::new(SnapshotConfig::new("/data/snapshots/squares"))?;
//! let pipeline = IterPipeline::new("range(1000).map(square)", || (0..1000u64).map(|x| x * x));
//! for element in snapshot.apply(&pipeline, MsgpackCodec::<u64>::new())? {
//!     let value = element?;
//!     // ...
//! }
//! ```
//!
//! Each call to `apply` is one run invocation: the run is fingerprinted, its
//! mode is selected once, and the returned stage serves the elements.

use crate::element::ElementCodec;
use crate::mode::{Decision, ModeSelector};
use crate::pipeline::Pipeline;
use crate::stage::{PassthroughStage, ReadStage, SnapshotStage, WriteThrough};
use std::sync::Arc;
use stratacache_core::{
    Clock, Fingerprint, FingerprintComputer, FingerprintInput, OwnerId, Result, RunStatus,
    SnapshotConfig,
};
use stratacache_durability::{MetadataStore, ShardReader, ShardWriter, SnapshotPaths};

/// Materialization cache for one snapshot configuration
#[derive(Debug, Clone)]
pub struct Snapshot {
    config: SnapshotConfig,
    store: MetadataStore,
    paths: SnapshotPaths,
    owner: Option<OwnerId>,
}

impl Snapshot {
    /// Create a snapshot wrapper
    ///
    /// Fails if the configuration is invalid. Nothing is touched on disk.
    pub fn new(config: SnapshotConfig) -> Result<Self> {
        config.validate()?;
        Ok(Snapshot {
            store: MetadataStore::from_config(&config),
            paths: SnapshotPaths::from_config(&config),
            config,
            owner: None,
        })
    }

    /// Use `clock` to age claims
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.store = self.store.with_clock(clock);
        self
    }

    /// Use a fixed owner id instead of a fresh one per invocation
    pub fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Configuration in force
    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Underlying metadata store
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Directory layout
    pub fn paths(&self) -> &SnapshotPaths {
        &self.paths
    }

    /// Fingerprint of the run `pipeline` would produce under this configuration
    pub fn fingerprint<P, C>(&self, pipeline: &P, codec: &C) -> Fingerprint
    where
        P: Pipeline,
        C: ElementCodec<Item = P::Item>,
    {
        let definition = pipeline.definition();
        FingerprintComputer.compute(&FingerprintInput {
            pipeline: &definition,
            path: &self.config.path,
            compression: self.config.compression,
            shard_size_bytes: self.config.shard_size_bytes,
            element_codec: codec.codec_id(),
        })
    }

    /// Current state of the run `pipeline` would produce
    pub fn probe<P, C>(&self, pipeline: &P, codec: &C) -> Result<RunStatus>
    where
        P: Pipeline,
        C: ElementCodec<Item = P::Item>,
    {
        self.store.probe(&self.fingerprint(pipeline, codec))
    }

    /// Start a run invocation
    ///
    /// Selects the run's mode and returns the stage serving its elements. In
    /// read mode the pipeline's elements are never requested.
    ///
    /// A write stage whose claim expires and is taken over by another worker
    /// still yields every source element and ends without an error; only the
    /// new owner's run is finalized.
    pub fn apply<P, C>(&self, pipeline: &P, codec: C) -> Result<SnapshotStage<P, C>>
    where
        P: Pipeline,
        C: ElementCodec<Item = P::Item>,
    {
        let fingerprint = self.fingerprint(pipeline, &codec);
        let owner = self.owner.unwrap_or_default();

        let stage = match ModeSelector::new(&self.store).select(&fingerprint, owner)? {
            Decision::Read { metadata } => {
                let dir = self.paths.reader_shard_dir(&fingerprint, &metadata.owner);
                let reader = ShardReader::open(dir, metadata.shards().to_vec())?;
                SnapshotStage::Read(ReadStage::new(metadata, reader, codec))
            }
            Decision::Write => {
                let writer = ShardWriter::create(
                    self.paths.writer_shard_dir(&fingerprint, &owner),
                    self.config.compression,
                    self.config.zstd_level,
                    self.config.shard_size_bytes,
                )?;
                SnapshotStage::Write(WriteThrough::new(
                    pipeline.elements(),
                    codec,
                    writer,
                    self.store.clone(),
                    fingerprint,
                    owner,
                ))
            }
            Decision::Passthrough { reason } => SnapshotStage::Passthrough(
                PassthroughStage::new(pipeline.elements(), fingerprint, reason),
            ),
        };
        Ok(stage)
    }
}
