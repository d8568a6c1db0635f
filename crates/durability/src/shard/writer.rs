//! Size-bounded shard writer
//!
//! Elements are framed straight into the compressor of the currently open
//! shard, which writes through to a temporary file. Once the uncompressed
//! body reaches the target shard size the compressor is finished, the file
//! is committed, and the next element opens a new shard. A non-final shard
//! therefore holds at most `shard_size_bytes` plus one framed element, and
//! memory use does not grow with the shard size.
//!
//! # Crash Safety
//!
//! Each shard is written with write-fsync-rename, so a shard file is either
//! complete or absent. Shards written before a crash are ignored: only the
//! inventory recorded at finalize is ever read back.

use super::checksum::ChecksumWriter;
use crate::codec::{check_zstd_level, ShardEncoder};
use crate::format::{shard_path, write_frame, FrameError, PendingFile};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use stratacache_core::{Compression, Error, Result, ShardDescriptor};
use tracing::debug;

type ShardStream = ShardEncoder<ChecksumWriter<BufWriter<File>>>;

/// A shard being written
struct OpenShard {
    index: u64,
    pending: PendingFile,
    encoder: ShardStream,
    byte_size: u64,
    element_count: u64,
}

impl OpenShard {
    fn create(dir: &Path, index: u64, compression: Compression, zstd_level: i32) -> Result<Self> {
        // The directory may have been swept since the previous shard
        std::fs::create_dir_all(dir)?;
        let (pending, file) = PendingFile::create(&shard_path(dir, index))?;
        let encoder = ShardEncoder::new(
            ChecksumWriter::new(BufWriter::new(file)),
            compression,
            zstd_level,
        )?;
        Ok(OpenShard {
            index,
            pending,
            encoder,
            byte_size: 0,
            element_count: 0,
        })
    }

    fn append(&mut self, element: &[u8]) -> Result<()> {
        let written = write_frame(&mut self.encoder, element).map_err(|e| match e {
            FrameError::Io(e) => Error::Io(e),
            other => Error::element(other.to_string()),
        })?;
        self.byte_size += written;
        self.element_count += 1;
        Ok(())
    }

    fn commit(self, compression: Compression) -> Result<ShardDescriptor> {
        let OpenShard {
            index,
            pending,
            encoder,
            byte_size,
            element_count,
        } = self;
        let (buffered, checksum, stored_size) = encoder.finish()?.into_parts();
        let file = buffered.into_inner().map_err(|e| e.into_error())?;
        let path = pending.target().to_path_buf();
        pending.commit(file)?;

        debug!(
            target: "stratacache::shard",
            index,
            elements = element_count,
            byte_size,
            stored_size,
            path = %path.display(),
            "Wrote shard"
        );
        Ok(ShardDescriptor {
            index,
            element_count,
            byte_size,
            stored_size,
            compression,
            checksum,
        })
    }
}

/// Writes the shards of one run
pub struct ShardWriter {
    dir: PathBuf,
    compression: Compression,
    zstd_level: i32,
    shard_size_bytes: u64,
    open: Option<OpenShard>,
    shards: Vec<ShardDescriptor>,
}

impl ShardWriter {
    /// Create a writer persisting shards into `dir`
    ///
    /// Creates the directory if it doesn't exist.
    pub fn create(
        dir: impl Into<PathBuf>,
        compression: Compression,
        zstd_level: i32,
        shard_size_bytes: u64,
    ) -> Result<Self> {
        if shard_size_bytes == 0 {
            return Err(Error::InvalidConfig(
                "shard_size_bytes must be greater than zero".to_string(),
            ));
        }
        if compression == Compression::Zstd {
            check_zstd_level(zstd_level)?;
        }
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(ShardWriter {
            dir,
            compression,
            zstd_level,
            shard_size_bytes,
            open: None,
            shards: Vec::new(),
        })
    }

    /// Shards persisted so far
    pub fn shards(&self) -> &[ShardDescriptor] {
        &self.shards
    }

    /// Append one encoded element
    ///
    /// Commits the open shard when its body reaches the target size.
    pub fn append(&mut self, element: &[u8]) -> Result<()> {
        let shard = match self.open.take() {
            Some(shard) => shard,
            None => OpenShard::create(
                &self.dir,
                self.shards.len() as u64,
                self.compression,
                self.zstd_level,
            )?,
        };
        let shard = self.open.insert(shard);
        shard.append(element)?;
        if shard.byte_size >= self.shard_size_bytes {
            self.close_shard()?;
        }
        Ok(())
    }

    /// Commit the open shard, if any, and return the shard inventory
    ///
    /// The writer is empty afterwards.
    pub fn finish(&mut self) -> Result<Vec<ShardDescriptor>> {
        self.close_shard()?;
        Ok(std::mem::take(&mut self.shards))
    }

    /// Drop everything written and remove the shard directory
    pub fn discard(&mut self) -> Result<()> {
        self.open = None;
        self.shards.clear();
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn close_shard(&mut self) -> Result<()> {
        if let Some(shard) = self.open.take() {
            let descriptor = shard.commit(self.compression)?;
            self.shards.push(descriptor);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ShardWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardWriter")
            .field("dir", &self.dir)
            .field("compression", &self.compression)
            .field("shard_size_bytes", &self.shard_size_bytes)
            .field("open_shard", &self.open.as_ref().map(|shard| shard.index))
            .field("shards", &self.shards.len())
            .finish()
    }
}
