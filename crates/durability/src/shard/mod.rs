//! Shard persistence: the size-bounded writer and the ordered reader.

mod checksum;
pub mod reader;
pub mod writer;

pub use reader::{ShardReader, VerifyReport};
pub use writer::ShardWriter;
