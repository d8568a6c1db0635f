//! Error types for the materialization cache
//!
//! This module defines the crate-wide error type. We use `thiserror` for
//! automatic `Display` and `Error` trait implementations.
//!
//! Not every failure is an error: a missing run directory, a corrupt metadata
//! record and a lost claim race all degrade to recomputing or passing elements
//! through. The variants here are the failures a consumer actually sees.

use crate::types::{Fingerprint, OwnerId};
use std::io;
use thiserror::Error;

/// Boxed error produced by an upstream source
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the materialization cache
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Data corruption detected while replaying a run
    #[error("Data corruption in {location}: {reason}")]
    Corruption {
        /// Where the corruption was found (file or shard)
        location: String,
        /// What was wrong
        reason: String,
    },

    /// Shard checksum verification failed
    #[error("Checksum mismatch in shard {shard}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Shard index
        shard: u64,
        /// Checksum recorded in the metadata
        expected: u32,
        /// Checksum computed from the file
        actual: u32,
    },

    /// Compression or decompression failed
    #[error("Codec error: {0}")]
    Codec(String),

    /// Element encoding or decoding failed
    #[error("Element codec error: {0}")]
    Element(String),

    /// Metadata record could not be serialized
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// The writer no longer holds the claim it is trying to finalize
    #[error("Claim on run {fingerprint} lost by owner {owner}")]
    ClaimLost {
        /// Run fingerprint
        fingerprint: Fingerprint,
        /// Owner that tried to finalize
        owner: OwnerId,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The upstream source failed; the original error is preserved
    #[error("Source error: {0}")]
    Source(BoxError),
}

impl Error {
    /// Create a corruption error
    pub fn corruption(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Corruption {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a codec error
    pub fn codec(msg: impl Into<String>) -> Self {
        Error::Codec(msg.into())
    }

    /// Create an element codec error
    pub fn element(msg: impl Into<String>) -> Self {
        Error::Element(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Error::Metadata(msg.into())
    }

    /// Wrap an upstream source error
    pub fn from_source(err: impl Into<BoxError>) -> Self {
        Error::Source(err.into())
    }

    /// Check if this error reports damaged or inconsistent persisted data
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::Corruption { .. } | Error::ChecksumMismatch { .. }
        )
    }

    /// Check if this error came from the upstream source
    pub fn is_source(&self) -> bool {
        matches!(self, Error::Source(_))
    }

    /// Borrow the original source error, if this is one
    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Source(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Metadata(e.to_string())
    }
}
