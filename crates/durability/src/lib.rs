//! Durability layer for StrataCache
//!
//! This crate handles everything that touches disk:
//!
//! - Run lifecycle store: probe / claim / finalize under a cross-process lock
//! - Shard writer: size-bounded, compressed, checksummed shards, streamed to disk
//! - Shard reader: ordered, verified replay
//! - On-disk formats (element frames, metadata record, atomic replacement)
//! - Streaming shard codecs (identity, gzip, zstd)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec; // Shard compression (identity, gzip, zstd)
pub mod format; // Frames, metadata record, write-fsync-rename
pub mod metadata_store; // Run lifecycle (probe, claim, finalize)
pub mod paths; // Run directory layout
pub mod shard; // Shard writer and reader

pub use codec::{CodecError, ShardDecoder, ShardEncoder};
pub use format::{FrameError, LOCK_FILE_NAME, METADATA_FILE_NAME};
pub use metadata_store::MetadataStore;
pub use paths::SnapshotPaths;
pub use shard::{ShardReader, ShardWriter, VerifyReport};
