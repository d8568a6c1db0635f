//! On-disk formats for runs.
//!
//! - `record`: element framing inside a shard body
//! - `metadata`: run directory layout and the JSON metadata record
//! - `atomic`: write-fsync-rename file replacement and temp-file naming

pub mod atomic;
pub mod metadata;
pub mod record;

pub use atomic::{is_temp_file, sync_dir, write_atomic, PendingFile};
pub use metadata::{
    decode_metadata, encode_metadata, shard_path, LOCK_FILE_NAME, METADATA_FILE_NAME,
    SHARD_FILE_EXTENSION,
};
pub use record::{read_frame, write_frame, FrameError, FRAME_HEADER_SIZE, MAX_FRAME_LEN};
