//! Core identifier types
//!
//! This module defines the foundational types:
//! - OwnerId: Unique identifier for the writer that claims a run
//! - Fingerprint: Stable identifier of a run (pipeline + path + parameters)
//! - Compression: Per-shard compression scheme

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a writer claiming a run
///
/// An OwnerId is a wrapper around a UUID v4. Every pipeline invocation gets a
/// fresh owner, which is recorded in the WRITING claim and names the directory
/// holding that writer's shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Create a new random OwnerId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an OwnerId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse an OwnerId from a string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    ///
    /// # Errors
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this OwnerId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a run
///
/// Rendered as 32 lowercase hex characters (xxh3-128). The fingerprint is also
/// the name of the run directory, so it must stay filesystem-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of a fingerprint in hex characters
    pub const HEX_LEN: usize = 32;

    /// Build a fingerprint from a 128-bit hash value
    pub fn from_u128(value: u128) -> Self {
        Self(format!("{:032x}", value))
    }

    /// Parse a fingerprint from its hex form
    ///
    /// Returns None unless the string is exactly 32 lowercase hex characters.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == Self::HEX_LEN
            && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Self(s.to_string()))
    }

    /// The hex string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for Fingerprint {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

/// Compression applied to each shard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Shards are stored as raw framed bytes
    #[default]
    None,
    /// gzip (deflate) compression
    Gzip,
    /// zstd compression
    Zstd,
}

impl Compression {
    /// Stable string identifier, also used in fingerprints
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = String;

    /// Parse a compression name case-insensitively.
    ///
    /// The empty string means no compression.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            "zstd" => Ok(Compression::Zstd),
            other => Err(format!(
                "unknown compression '{}', expected NONE, GZIP or ZSTD",
                other
            )),
        }
    }
}
