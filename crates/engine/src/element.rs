//! Element codecs
//!
//! Shards store opaque bytes. An element codec turns pipeline elements into
//! those bytes and back. Its `codec_id` is part of the run fingerprint, so a
//! run written with one encoding is never replayed through another.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use stratacache_core::{Error, Result};

/// Encodes pipeline elements for storage
pub trait ElementCodec: Send + Sync {
    /// Element type handled by this codec
    type Item;

    /// Encode one element
    fn encode(&self, item: &Self::Item) -> Result<Vec<u8>>;

    /// Decode one element
    fn decode(&self, bytes: &[u8]) -> Result<Self::Item>;

    /// Stable identifier of the encoding
    fn codec_id(&self) -> &str;
}

/// MessagePack encoding for any serde type (`rmp-serde`)
pub struct MsgpackCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> MsgpackCodec<T> {
    /// Create a codec
    pub fn new() -> Self {
        MsgpackCodec {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for MsgpackCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MsgpackCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for MsgpackCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MsgpackCodec")
    }
}

impl<T> ElementCodec for MsgpackCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Item = T;

    fn encode(&self, item: &T) -> Result<Vec<u8>> {
        rmp_serde::to_vec(item).map_err(|e| Error::element(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::element(e.to_string()))
    }

    fn codec_id(&self) -> &str {
        "msgpack"
    }
}

/// Raw byte elements, stored as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl ElementCodec for BytesCodec {
    type Item = Vec<u8>;

    fn encode(&self, item: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(item.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn codec_id(&self) -> &str {
        "bytes"
    }
}
