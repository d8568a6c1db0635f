//! Decompressing side of the shard codecs.

use super::CodecError;
use flate2::bufread::GzDecoder;
use std::io::{self, BufRead, Read};
use stratacache_core::Compression;

/// Decompresses a shard body from an underlying reader.
pub enum ShardDecoder<R: BufRead> {
    /// No compression
    Identity(R),
    /// gzip
    Gzip(GzDecoder<R>),
    /// zstd
    Zstd(zstd::stream::read::Decoder<'static, R>),
}

impl<R: BufRead> ShardDecoder<R> {
    /// Wrap `inner` with the decompressor for `compression`.
    pub fn new(inner: R, compression: Compression) -> Result<Self, CodecError> {
        match compression {
            Compression::None => Ok(ShardDecoder::Identity(inner)),
            Compression::Gzip => Ok(ShardDecoder::Gzip(GzDecoder::new(inner))),
            Compression::Zstd => {
                let decoder = zstd::stream::read::Decoder::with_buffer(inner).map_err(|e| {
                    CodecError::DecoderError {
                        codec_id: "zstd".to_string(),
                        detail: e.to_string(),
                    }
                })?;
                Ok(ShardDecoder::Zstd(decoder))
            }
        }
    }
}

impl<R: BufRead> Read for ShardDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ShardDecoder::Identity(inner) => inner.read(buf),
            ShardDecoder::Gzip(decoder) => decoder.read(buf),
            ShardDecoder::Zstd(decoder) => decoder.read(buf),
        }
    }
}
