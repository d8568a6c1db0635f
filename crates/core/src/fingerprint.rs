//! Run fingerprinting
//!
//! A fingerprint names a run: identical inputs always give the identical
//! fingerprint, and any change to the pipeline definition, target path,
//! materialization parameters or element encoding gives a different one.
//!
//! Reusing a stale snapshot for a changed pipeline is the failure to avoid, so
//! everything that shapes the stored bytes is hashed. Storage knobs that do not
//! (reader/writer path prefixes, expiry) are left out so that readers and
//! writers of the same pipeline agree.
//!
//! Each field is tagged and length-prefixed before hashing so that adjacent
//! fields cannot alias (`"ab" + "c"` vs `"a" + "bc"`).

use crate::types::{Compression, Fingerprint};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

/// Version of the fingerprint derivation
///
/// Bump when the hashed fields change so old runs are never matched.
pub const FINGERPRINT_VERSION: u32 = 1;

/// Field tags mixed into the hash
mod tags {
    pub const VERSION: u8 = 0x01;
    pub const PIPELINE: u8 = 0x02;
    pub const PATH: u8 = 0x03;
    pub const COMPRESSION: u8 = 0x04;
    pub const SHARD_SIZE: u8 = 0x05;
    pub const ELEMENT_CODEC: u8 = 0x06;
}

/// Inputs that identify a run
#[derive(Debug, Clone, Copy)]
pub struct FingerprintInput<'a> {
    /// Stable serialized definition of the upstream computation
    pub pipeline: &'a [u8],
    /// Target snapshot path (without reader/writer prefixes)
    pub path: &'a Path,
    /// Shard compression
    pub compression: Compression,
    /// Target shard size
    pub shard_size_bytes: u64,
    /// Identifier of the element encoding
    pub element_codec: &'a str,
}

/// Derives run fingerprints
///
/// Pure: no I/O, no clock, no randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintComputer;

impl FingerprintComputer {
    /// Compute the fingerprint of a run
    pub fn compute(&self, input: &FingerprintInput<'_>) -> Fingerprint {
        let mut hasher = Xxh3::new();
        write_field(&mut hasher, tags::VERSION, &FINGERPRINT_VERSION.to_le_bytes());
        write_field(&mut hasher, tags::PIPELINE, input.pipeline);
        write_field(&mut hasher, tags::PATH, normalized_path(input.path).as_bytes());
        write_field(
            &mut hasher,
            tags::COMPRESSION,
            input.compression.as_str().as_bytes(),
        );
        write_field(
            &mut hasher,
            tags::SHARD_SIZE,
            &input.shard_size_bytes.to_le_bytes(),
        );
        write_field(
            &mut hasher,
            tags::ELEMENT_CODEC,
            input.element_codec.as_bytes(),
        );
        Fingerprint::from_u128(hasher.digest128())
    }
}

fn write_field(hasher: &mut Xxh3, tag: u8, data: &[u8]) {
    hasher.update(&[tag]);
    hasher.update(&(data.len() as u64).to_le_bytes());
    hasher.update(data);
}

/// Path text with trailing separators removed
///
/// `/data/snap` and `/data/snap/` name the same directory.
fn normalized_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    let trimmed = text.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        text.into_owned()
    } else {
        trimmed.to_string()
    }
}
