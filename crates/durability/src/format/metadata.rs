//! Run directory file names and the metadata record encoding.
//!
//! ```text
//! <root>/<fingerprint>/
//! ├── snapshot.metadata        # JSON RunMetadata
//! ├── snapshot.lock            # claim/finalize lock
//! └── <owner>/                 # shards (under the reader/writer prefix)
//!     ├── 00000000.snapshot
//!     └── 00000001.snapshot
//! ```

use std::path::{Path, PathBuf};
use stratacache_core::RunMetadata;

/// Metadata record file name.
pub const METADATA_FILE_NAME: &str = "snapshot.metadata";

/// Lock file name.
pub const LOCK_FILE_NAME: &str = "snapshot.lock";

/// Shard file extension.
pub const SHARD_FILE_EXTENSION: &str = "snapshot";

/// Generate the path of shard `index` inside `dir`.
pub fn shard_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{:08}.{}", index, SHARD_FILE_EXTENSION))
}

/// Serialize a metadata record.
pub fn encode_metadata(metadata: &RunMetadata) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(metadata)
}

/// Parse and validate a metadata record.
///
/// Returns a description of the problem for unparsable or inconsistent
/// records.
pub fn decode_metadata(bytes: &[u8]) -> Result<RunMetadata, String> {
    let metadata: RunMetadata = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    metadata.validate()?;
    Ok(metadata)
}
