//! Run lifecycle types
//!
//! A run is one materialization of a pipeline, keyed by its fingerprint.
//!
//! ## Lifecycle
//!
//! ```text
//! ABSENT ──claim──▶ WRITING ──finalize──▶ DONE
//!                      │
//!                      └── age > expiry ──▶ EXPIRED ──claim──▶ WRITING
//! ```
//!
//! - `RunMetadata`: the persisted record (one per run directory)
//! - `RunState`: WRITING or DONE, as stored on disk
//! - `RunStatus`: what a probe observed, including ABSENT and expiry
//! - `ExpiryPolicy`: when an unfinished claim counts as abandoned

use crate::types::{Compression, Fingerprint, OwnerId};
use serde::{Deserialize, Serialize};

/// Current metadata record format version
pub const METADATA_FORMAT_VERSION: u32 = 1;

/// One persisted shard of a run
///
/// Immutable once the run reaches DONE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardDescriptor {
    /// 0-based position of the shard within the run
    pub index: u64,
    /// Number of elements in the shard
    pub element_count: u64,
    /// Uncompressed size of the framed elements
    pub byte_size: u64,
    /// Size of the shard file on disk
    pub stored_size: u64,
    /// Compression used for this shard
    pub compression: Compression,
    /// CRC32 of the stored (compressed) bytes
    pub checksum: u32,
}

/// Persisted lifecycle state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// An owner has claimed the run and is writing shards
    Writing,
    /// The run is complete and its shard inventory is final
    Done {
        /// Shards in ascending index order
        shards: Vec<ShardDescriptor>,
        /// Total element count across all shards
        element_count: u64,
        /// When the run was finalized (seconds since epoch)
        finalized_at: u64,
    },
}

/// Persisted record for a run
///
/// Written exactly twice per successful run: once when the run is claimed
/// (WRITING) and once when it is finalized (DONE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Record format version
    pub format_version: u32,
    /// Fingerprint of the run
    pub fingerprint: Fingerprint,
    /// Writer that claimed the run
    pub owner: OwnerId,
    /// When the claim was made (seconds since epoch)
    pub created_at: u64,
    /// Compression used for the run's shards
    pub compression: Compression,
    /// Target uncompressed shard size
    pub shard_size_bytes: u64,
    /// WRITING or DONE
    #[serde(flatten)]
    pub state: RunState,
}

impl RunMetadata {
    /// Create the WRITING record for a fresh claim
    pub fn writing(
        fingerprint: Fingerprint,
        owner: OwnerId,
        created_at: u64,
        compression: Compression,
        shard_size_bytes: u64,
    ) -> Self {
        RunMetadata {
            format_version: METADATA_FORMAT_VERSION,
            fingerprint,
            owner,
            created_at,
            compression,
            shard_size_bytes,
            state: RunState::Writing,
        }
    }

    /// Turn a WRITING record into the DONE record with the given shards
    pub fn into_done(self, shards: Vec<ShardDescriptor>, finalized_at: u64) -> Self {
        let element_count = shards.iter().map(|s| s.element_count).sum();
        RunMetadata {
            state: RunState::Done {
                shards,
                element_count,
                finalized_at,
            },
            ..self
        }
    }

    /// Check if the run is complete
    pub fn is_done(&self) -> bool {
        matches!(self.state, RunState::Done { .. })
    }

    /// Check if the run is still being written
    pub fn is_writing(&self) -> bool {
        matches!(self.state, RunState::Writing)
    }

    /// Shard inventory (empty unless DONE)
    pub fn shards(&self) -> &[ShardDescriptor] {
        match &self.state {
            RunState::Done { shards, .. } => shards,
            RunState::Writing => &[],
        }
    }

    /// Total element count (None unless DONE)
    pub fn element_count(&self) -> Option<u64> {
        match &self.state {
            RunState::Done { element_count, .. } => Some(*element_count),
            RunState::Writing => None,
        }
    }

    /// Age of the claim relative to `now_secs`, saturating at zero
    pub fn age_seconds(&self, now_secs: u64) -> u64 {
        now_secs.saturating_sub(self.created_at)
    }

    /// State name for display
    pub fn state_str(&self) -> &'static str {
        match self.state {
            RunState::Writing => "writing",
            RunState::Done { .. } => "done",
        }
    }

    /// Check structural invariants of the record
    ///
    /// A DONE record must list shards with contiguous indices starting at 0
    /// and an element count equal to the sum over its shards.
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != METADATA_FORMAT_VERSION {
            return Err(format!(
                "unsupported metadata format version {}",
                self.format_version
            ));
        }
        if let RunState::Done {
            shards,
            element_count,
            ..
        } = &self.state
        {
            for (position, shard) in shards.iter().enumerate() {
                if shard.index != position as u64 {
                    return Err(format!(
                        "shard at position {} has index {}",
                        position, shard.index
                    ));
                }
            }
            let total = shards
                .iter()
                .try_fold(0u64, |total, s| total.checked_add(s.element_count))
                .ok_or_else(|| "shard element counts overflow".to_string())?;
            if total != *element_count {
                return Err(format!(
                    "element count {} does not match shard total {}",
                    element_count, total
                ));
            }
        }
        Ok(())
    }
}

/// When an unfinished WRITING claim counts as abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Claims never expire
    Never,
    /// Claims older than this many seconds are reclaimable
    After(u64),
}

impl ExpiryPolicy {
    /// Build a policy from a configured value; negative disables expiry
    pub fn from_seconds(seconds: i64) -> Self {
        if seconds < 0 {
            ExpiryPolicy::Never
        } else {
            ExpiryPolicy::After(seconds as u64)
        }
    }

    /// Check whether a claim of the given age has expired
    ///
    /// A claim exactly `expiry` seconds old is still live.
    pub fn is_expired(&self, age_seconds: u64) -> bool {
        match self {
            ExpiryPolicy::Never => false,
            ExpiryPolicy::After(limit) => age_seconds > *limit,
        }
    }
}

/// Result of probing a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// No (valid) record exists
    Absent,
    /// An owner holds a claim
    Writing {
        /// Claim holder
        owner: OwnerId,
        /// Seconds since the claim was made
        age_seconds: u64,
        /// Whether the claim is past the expiry policy
        expired: bool,
    },
    /// The run is complete
    Done {
        /// The finalized record, including the shard inventory
        metadata: RunMetadata,
    },
}

impl RunStatus {
    /// Check if the run is absent
    pub fn is_absent(&self) -> bool {
        matches!(self, RunStatus::Absent)
    }

    /// Check if the run is complete
    pub fn is_done(&self) -> bool {
        matches!(self, RunStatus::Done { .. })
    }

    /// Check if the run is held by a live (unexpired) claim
    pub fn is_live_claim(&self) -> bool {
        matches!(self, RunStatus::Writing { expired: false, .. })
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Absent => "absent",
            RunStatus::Writing { expired: false, .. } => "writing",
            RunStatus::Writing { expired: true, .. } => "expired",
            RunStatus::Done { .. } => "done",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
