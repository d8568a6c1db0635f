//! Shard compression codecs.
//!
//! Shards are compressed as streams so a shard never has to fit in memory.
//! The codec for a run is selected from its `Compression` setting:
//!
//! - `Compression::None` → pass-through
//! - `Compression::Gzip` → gzip (`flate2`)
//! - `Compression::Zstd` → zstd, at the configured level
//!
//! # Usage
//!
//! ```ignore
//! use stratacache_durability::codec::{ShardDecoder, ShardEncoder};
//! use stratacache_core::Compression;
//!
//! let mut encoder = ShardEncoder::new(Vec::new(), Compression::Gzip, 3)?;
//! encoder.write_all(b"hello world")?;
//! let stored = encoder.finish()?;
//!
//! let mut decoder = ShardDecoder::new(&stored[..], Compression::Gzip)?;
//! let mut body = Vec::new();
//! decoder.read_to_end(&mut body)?;
//! ```

mod decoder;
mod encoder;

pub use decoder::ShardDecoder;
pub use encoder::ShardEncoder;

/// Smallest accepted zstd level.
pub const MIN_ZSTD_LEVEL: i32 = 1;

/// Largest accepted zstd level.
pub const MAX_ZSTD_LEVEL: i32 = 22;

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Setting up a compressor failed.
    #[error("Encoder error (codec={codec_id}): {detail}")]
    EncoderError {
        /// Codec that failed
        codec_id: String,
        /// Human-readable error description
        detail: String,
    },

    /// Setting up a decompressor failed.
    #[error("Decoder error (codec={codec_id}): {detail}")]
    DecoderError {
        /// Codec that failed
        codec_id: String,
        /// Human-readable error description
        detail: String,
    },

    /// Compression level outside the codec's range.
    #[error("Invalid level {level} for codec {codec_id}")]
    InvalidLevel {
        /// Codec ID
        codec_id: String,
        /// Rejected level
        level: i32,
    },
}

impl From<CodecError> for stratacache_core::Error {
    fn from(e: CodecError) -> Self {
        stratacache_core::Error::Codec(e.to_string())
    }
}

/// Check a zstd compression level.
pub fn check_zstd_level(level: i32) -> Result<(), CodecError> {
    if (MIN_ZSTD_LEVEL..=MAX_ZSTD_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(CodecError::InvalidLevel {
            codec_id: "zstd".to_string(),
            level,
        })
    }
}
