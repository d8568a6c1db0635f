//! Core types and traits for StrataCache
//!
//! This crate defines the foundational types used throughout the system:
//! - OwnerId / Fingerprint / Compression: identifiers and parameters of a run
//! - RunMetadata / RunState / ShardDescriptor: the persisted run record
//! - RunStatus / ExpiryPolicy: probe results and claim expiry
//! - SnapshotConfig: the explicit configuration surface
//! - FingerprintComputer: stable run identifiers
//! - Clock: injectable wall clock for claim ages
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod run_types;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ConfigError, SnapshotConfig, DEFAULT_PENDING_SNAPSHOT_EXPIRY_SECONDS,
    DEFAULT_SHARD_SIZE_BYTES, DEFAULT_ZSTD_LEVEL,
};
pub use error::{BoxError, Error, Result};
pub use fingerprint::{FingerprintComputer, FingerprintInput, FINGERPRINT_VERSION};
pub use run_types::{
    ExpiryPolicy, RunMetadata, RunState, RunStatus, ShardDescriptor, METADATA_FORMAT_VERSION,
};
pub use types::{Compression, Fingerprint, OwnerId};
