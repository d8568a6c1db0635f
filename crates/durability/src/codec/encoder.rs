//! Compressing side of the shard codecs.

use super::{check_zstd_level, CodecError};
use flate2::write::GzEncoder;
use std::io::{self, Write};
use stratacache_core::Compression;

/// Compresses a shard body into an underlying writer.
///
/// Call `finish` to flush the compressor trailer and get the writer back;
/// dropping an unfinished encoder leaves an incomplete stream behind.
pub enum ShardEncoder<W: Write> {
    /// No compression
    Identity(W),
    /// gzip
    Gzip(GzEncoder<W>),
    /// zstd
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> ShardEncoder<W> {
    /// Wrap `inner` with the compressor for `compression`.
    ///
    /// `zstd_level` is only consulted for `Compression::Zstd`.
    pub fn new(inner: W, compression: Compression, zstd_level: i32) -> Result<Self, CodecError> {
        match compression {
            Compression::None => Ok(ShardEncoder::Identity(inner)),
            Compression::Gzip => Ok(ShardEncoder::Gzip(GzEncoder::new(
                inner,
                flate2::Compression::default(),
            ))),
            Compression::Zstd => {
                check_zstd_level(zstd_level)?;
                let encoder = zstd::stream::write::Encoder::new(inner, zstd_level).map_err(|e| {
                    CodecError::EncoderError {
                        codec_id: "zstd".to_string(),
                        detail: e.to_string(),
                    }
                })?;
                Ok(ShardEncoder::Zstd(encoder))
            }
        }
    }

    /// Complete the compressed stream and return the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            ShardEncoder::Identity(inner) => Ok(inner),
            ShardEncoder::Gzip(encoder) => encoder.finish(),
            ShardEncoder::Zstd(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for ShardEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ShardEncoder::Identity(inner) => inner.write(buf),
            ShardEncoder::Gzip(encoder) => encoder.write(buf),
            ShardEncoder::Zstd(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ShardEncoder::Identity(inner) => inner.flush(),
            ShardEncoder::Gzip(encoder) => encoder.flush(),
            ShardEncoder::Zstd(encoder) => encoder.flush(),
        }
    }
}
