//! Snapshot engine for StrataCache
//!
//! This crate wires the lower layers into a transparent cache around a
//! pipeline:
//! - Snapshot: entry point, one run invocation per `apply`
//! - Mode selection: READ / WRITE / PASSTHROUGH, decided once per run
//! - Stages: the iterators that replay, write through, or pass through
//! - Pipelines and element codecs: the seams to the upstream computation
//!
//! The engine is the only component that knows about:
//! - Element types and their encoding
//! - How a source is consumed while its run is written

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod element;
pub mod mode;
pub mod pipeline;
pub mod snapshot;
pub mod stage;

pub use element::{BytesCodec, ElementCodec, MsgpackCodec};
pub use mode::{Decision, Mode, ModeSelector, PassthroughReason};
pub use pipeline::{FnPipeline, IterPipeline, Pipeline};
pub use snapshot::Snapshot;
pub use stage::{PassthroughStage, ReadStage, SnapshotStage, WriteThrough};
