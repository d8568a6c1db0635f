//! Ordered shard reader
//!
//! Replays the elements of a finished run in their original order. One shard
//! is open at a time: its stored bytes are checksummed in a streaming pass,
//! then frames are decompressed and decoded as elements are pulled. Every
//! persisted fact in the descriptor is checked:
//!
//! - indices are contiguous from 0
//! - file length equals `stored_size`
//! - CRC32 of the stored bytes equals `checksum`
//! - decompressed length equals `byte_size`
//! - frame count equals `element_count`
//!
//! Recorded sizes and counts are never trusted for allocation; a frame that
//! claims more than the shard has left is rejected before it is read. Any
//! mismatch is a corruption error. After the first error the reader yields
//! nothing more.

use super::checksum::checksum_stream;
use crate::codec::ShardDecoder;
use crate::format::{read_frame, shard_path, FRAME_HEADER_SIZE};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use stratacache_core::{Error, Result, ShardDescriptor};
use tracing::debug;

/// Summary of a full verification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Shards read
    pub shards: u64,
    /// Elements decoded
    pub elements: u64,
    /// Uncompressed bytes
    pub byte_size: u64,
    /// Bytes on disk
    pub stored_size: u64,
}

/// One verified shard, decoded frame by frame
struct OpenShard {
    descriptor: ShardDescriptor,
    location: String,
    decoder: ShardDecoder<BufReader<File>>,
    byte_size: u64,
    element_count: u64,
}

impl OpenShard {
    fn open(dir: &Path, descriptor: &ShardDescriptor) -> Result<Self> {
        let path = shard_path(dir, descriptor.index);
        let location = path.display().to_string();
        let mut file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::corruption(location.clone(), "shard file missing")
            } else {
                Error::Io(e)
            }
        })?;

        let (actual, stored_size) = checksum_stream(BufReader::new(&mut file))?;
        if stored_size != descriptor.stored_size {
            return Err(Error::corruption(
                location,
                format!(
                    "stored size {} does not match recorded {}",
                    stored_size, descriptor.stored_size
                ),
            ));
        }
        if actual != descriptor.checksum {
            return Err(Error::ChecksumMismatch {
                shard: descriptor.index,
                expected: descriptor.checksum,
                actual,
            });
        }

        file.seek(SeekFrom::Start(0))?;
        let decoder = ShardDecoder::new(BufReader::new(file), descriptor.compression)
            .map_err(|e| Error::corruption(location.clone(), e.to_string()))?;
        Ok(OpenShard {
            descriptor: descriptor.clone(),
            location,
            decoder,
            byte_size: 0,
            element_count: 0,
        })
    }

    fn next_element(&mut self) -> Result<Option<Vec<u8>>> {
        let remaining = self.descriptor.byte_size.saturating_sub(self.byte_size);
        let element = read_frame(&mut self.decoder, remaining)
            .map_err(|e| Error::corruption(self.location.clone(), e.to_string()))?;
        match element {
            Some(element) => {
                self.byte_size += (FRAME_HEADER_SIZE + element.len()) as u64;
                self.element_count += 1;
                if self.element_count > self.descriptor.element_count {
                    return Err(self.count_mismatch());
                }
                Ok(Some(element))
            }
            None => {
                if self.byte_size != self.descriptor.byte_size {
                    return Err(Error::corruption(
                        self.location.clone(),
                        format!(
                            "decompressed size {} does not match recorded {}",
                            self.byte_size, self.descriptor.byte_size
                        ),
                    ));
                }
                if self.element_count != self.descriptor.element_count {
                    return Err(self.count_mismatch());
                }
                debug!(
                    target: "stratacache::shard",
                    index = self.descriptor.index,
                    elements = self.element_count,
                    "Replayed shard"
                );
                Ok(None)
            }
        }
    }

    fn count_mismatch(&self) -> Error {
        Error::corruption(
            self.location.clone(),
            format!(
                "decoded {} elements, recorded {}",
                self.element_count, self.descriptor.element_count
            ),
        )
    }
}

/// Streams the elements of a run
pub struct ShardReader {
    dir: PathBuf,
    shards: Vec<ShardDescriptor>,
    next_shard: usize,
    current: Option<OpenShard>,
    failed: bool,
}

impl ShardReader {
    /// Open a reader over the shards in `dir`
    ///
    /// No file is touched until the first element is pulled.
    pub fn open(dir: impl Into<PathBuf>, shards: Vec<ShardDescriptor>) -> Result<Self> {
        let dir = dir.into();
        for (position, shard) in shards.iter().enumerate() {
            if shard.index != position as u64 {
                return Err(Error::corruption(
                    dir.display().to_string(),
                    format!(
                        "shard inventory not contiguous: position {} has index {}",
                        position, shard.index
                    ),
                ));
            }
        }
        Ok(ShardReader {
            dir,
            shards,
            next_shard: 0,
            current: None,
            failed: false,
        })
    }

    /// Read every shard without keeping its elements
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        for descriptor in &self.shards {
            let mut shard = OpenShard::open(&self.dir, descriptor)?;
            while shard.next_element()?.is_some() {}
            report.shards += 1;
            report.elements += shard.element_count;
            report.byte_size += shard.byte_size;
            report.stored_size += descriptor.stored_size;
        }
        Ok(report)
    }

    fn advance(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(shard) = self.current.as_mut() {
                if let Some(element) = shard.next_element()? {
                    return Ok(Some(element));
                }
                self.current = None;
            }
            let Some(descriptor) = self.shards.get(self.next_shard) else {
                return Ok(None);
            };
            self.current = Some(OpenShard::open(&self.dir, descriptor)?);
            self.next_shard += 1;
        }
    }
}

impl Iterator for ShardReader {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.advance() {
            Ok(element) => element.map(Ok),
            Err(e) => {
                self.failed = true;
                self.current = None;
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for ShardReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardReader")
            .field("dir", &self.dir)
            .field("shards", &self.shards.len())
            .field("next_shard", &self.next_shard)
            .field("failed", &self.failed)
            .finish()
    }
}
