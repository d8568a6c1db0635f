//! Per-run mode selection
//!
//! Evaluated once per run invocation against the metadata store:
//!
//! | Probe result              | Action | Mode        |
//! |---------------------------|--------|-------------|
//! | DONE                      | -      | Read        |
//! | WRITING, live             | -      | Passthrough |
//! | WRITING, expired / ABSENT | claim  | Write if won, else Passthrough |

use stratacache_core::{Fingerprint, OwnerId, Result, RunMetadata, RunStatus};
use stratacache_durability::MetadataStore;
use tracing::info;

/// How a stage serves its elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Replay a finished run from its shards
    Read,
    /// Pass source elements through while persisting them
    Write,
    /// Pass source elements through untouched
    Passthrough,
}

impl Mode {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Read => "read",
            Mode::Write => "write",
            Mode::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stage passes elements through instead of caching them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// Another owner holds a live claim
    ClaimHeld {
        /// Claim holder
        owner: OwnerId,
        /// Age of the claim in seconds
        age_seconds: u64,
    },
    /// The run was claimable but another owner won the claim
    ClaimRaceLost,
}

impl std::fmt::Display for PassthroughReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassthroughReason::ClaimHeld { owner, age_seconds } => {
                write!(f, "run held by {} for {}s", owner, age_seconds)
            }
            PassthroughReason::ClaimRaceLost => f.write_str("claim race lost"),
        }
    }
}

/// Outcome of mode selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Replay the finished run
    Read {
        /// Finalized record with the shard inventory
        metadata: RunMetadata,
    },
    /// This owner now holds the claim
    Write,
    /// Serve the source directly
    Passthrough {
        /// Why the run is not being cached
        reason: PassthroughReason,
    },
}

impl Decision {
    /// Mode this decision selects
    pub fn mode(&self) -> Mode {
        match self {
            Decision::Read { .. } => Mode::Read,
            Decision::Write => Mode::Write,
            Decision::Passthrough { .. } => Mode::Passthrough,
        }
    }
}

/// Decides the mode of a run
#[derive(Debug, Clone, Copy)]
pub struct ModeSelector<'a> {
    store: &'a MetadataStore,
}

impl<'a> ModeSelector<'a> {
    /// Create a selector over a store
    pub fn new(store: &'a MetadataStore) -> Self {
        ModeSelector { store }
    }

    /// Select the mode of `fingerprint` for `owner`
    ///
    /// May claim the run; a `Write` decision means `owner` holds the claim.
    pub fn select(&self, fingerprint: &Fingerprint, owner: OwnerId) -> Result<Decision> {
        let decision = match self.store.probe(fingerprint)? {
            RunStatus::Done { metadata } => Decision::Read { metadata },
            RunStatus::Writing {
                owner: holder,
                age_seconds,
                expired: false,
            } => Decision::Passthrough {
                reason: PassthroughReason::ClaimHeld {
                    owner: holder,
                    age_seconds,
                },
            },
            RunStatus::Writing { expired: true, .. } | RunStatus::Absent => {
                if self.store.claim(fingerprint, owner)? {
                    Decision::Write
                } else {
                    Decision::Passthrough {
                        reason: PassthroughReason::ClaimRaceLost,
                    }
                }
            }
        };

        match &decision {
            Decision::Passthrough { reason } => info!(
                target: "stratacache::stage",
                fingerprint = %fingerprint,
                owner = %owner,
                reason = %reason,
                "Snapshot mode: passthrough"
            ),
            other => info!(
                target: "stratacache::stage",
                fingerprint = %fingerprint,
                owner = %owner,
                mode = %other.mode(),
                "Snapshot mode selected"
            ),
        }
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stratacache_core::{ExpiryPolicy, ManualClock};

    fn store(dir: &tempfile::TempDir, clock: Arc<ManualClock>) -> MetadataStore {
        MetadataStore::new(dir.path())
            .with_expiry(ExpiryPolicy::After(60))
            .with_clock(clock)
    }

    #[test]
    fn test_absent_selects_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Arc::new(ManualClock::new(0)));
        let decision = ModeSelector::new(&store)
            .select(&Fingerprint::from_u128(1), OwnerId::new())
            .unwrap();
        assert_eq!(decision, Decision::Write);
    }

    #[test]
    fn test_live_claim_selects_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store(&dir, clock.clone());
        let fp = Fingerprint::from_u128(1);
        let holder = OwnerId::new();
        store.claim(&fp, holder).unwrap();
        clock.advance(5);

        let decision = ModeSelector::new(&store).select(&fp, OwnerId::new()).unwrap();
        assert_eq!(
            decision,
            Decision::Passthrough {
                reason: PassthroughReason::ClaimHeld {
                    owner: holder,
                    age_seconds: 5
                }
            }
        );
        assert_eq!(decision.mode(), Mode::Passthrough);
    }

    #[test]
    fn test_expired_claim_selects_write() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store(&dir, clock.clone());
        let fp = Fingerprint::from_u128(1);
        store.claim(&fp, OwnerId::new()).unwrap();
        clock.advance(61);

        let owner = OwnerId::new();
        let decision = ModeSelector::new(&store).select(&fp, owner).unwrap();
        assert_eq!(decision, Decision::Write);
        assert!(matches!(
            store.probe(&fp).unwrap(),
            RunStatus::Writing { owner: o, .. } if o == owner
        ));
    }

    #[test]
    fn test_done_selects_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir, Arc::new(ManualClock::new(0)));
        let fp = Fingerprint::from_u128(1);
        let owner = OwnerId::new();
        store.claim(&fp, owner).unwrap();
        store.finalize(&fp, owner, vec![]).unwrap();

        let decision = ModeSelector::new(&store).select(&fp, OwnerId::new()).unwrap();
        assert_eq!(decision.mode(), Mode::Read);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Read.to_string(), "read");
        assert_eq!(Mode::Write.to_string(), "write");
        assert_eq!(Mode::Passthrough.to_string(), "passthrough");
        assert_eq!(PassthroughReason::ClaimRaceLost.to_string(), "claim race lost");
    }
}
