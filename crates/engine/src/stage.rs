//! Snapshot stages
//!
//! A stage is the iterator a consumer pulls from. It is one of three
//! variants, fixed when the run's mode is selected:
//!
//! - `Read`: decodes the elements of a finished run; the source is never
//!   started
//! - `Write`: yields source elements unchanged while persisting them, then
//!   finalizes the run when the source is exhausted
//! - `Passthrough`: yields source elements unchanged and touches no files
//!
//! Every variant yields `Result<Item, Error>`. Source failures arrive as
//! `Error::Source` carrying the original error. Persisted bytes that do not
//! decode on replay are corruption, like a bad checksum. After any error the
//! stage yields nothing more.
//!
//! A write-through stage that fails or is dropped early removes its shards
//! and leaves its run unfinalized, to be reclaimed once its claim expires. A
//! write-through stage whose claim was taken over keeps yielding source
//! elements but stops persisting them; it drops its shards and ends without
//! an error, leaving the run to the new owner.

use crate::element::ElementCodec;
use crate::mode::{Mode, PassthroughReason};
use crate::pipeline::Pipeline;
use stratacache_core::{Error, Fingerprint, OwnerId, Result, RunMetadata};
use stratacache_durability::{MetadataStore, ShardReader, ShardWriter};
use tracing::{debug, info, warn};

/// Iterator over the elements of one run invocation
pub enum SnapshotStage<P: Pipeline, C: ElementCodec<Item = P::Item>> {
    /// Replay of a finished run
    Read(ReadStage<C>),
    /// Source elements persisted on the way through
    Write(WriteThrough<P, C>),
    /// Source elements served directly
    Passthrough(PassthroughStage<P>),
}

impl<P, C> SnapshotStage<P, C>
where
    P: Pipeline,
    C: ElementCodec<Item = P::Item>,
{
    /// Mode this stage runs in
    pub fn mode(&self) -> Mode {
        match self {
            SnapshotStage::Read(_) => Mode::Read,
            SnapshotStage::Write(_) => Mode::Write,
            SnapshotStage::Passthrough(_) => Mode::Passthrough,
        }
    }

    /// Fingerprint of the run
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            SnapshotStage::Read(stage) => &stage.metadata.fingerprint,
            SnapshotStage::Write(stage) => &stage.fingerprint,
            SnapshotStage::Passthrough(stage) => &stage.fingerprint,
        }
    }

    /// Why the stage is passing elements through, if it is
    pub fn passthrough_reason(&self) -> Option<PassthroughReason> {
        match self {
            SnapshotStage::Passthrough(stage) => Some(stage.reason),
            _ => None,
        }
    }
}

impl<P, C> Iterator for SnapshotStage<P, C>
where
    P: Pipeline,
    C: ElementCodec<Item = P::Item>,
{
    type Item = Result<P::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SnapshotStage::Read(stage) => stage.next(),
            SnapshotStage::Write(stage) => stage.next(),
            SnapshotStage::Passthrough(stage) => stage.next(),
        }
    }
}

impl<P, C> std::fmt::Debug for SnapshotStage<P, C>
where
    P: Pipeline,
    C: ElementCodec<Item = P::Item>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStage")
            .field("mode", &self.mode())
            .field("fingerprint", self.fingerprint())
            .finish()
    }
}

/// Replays a finished run
pub struct ReadStage<C> {
    metadata: RunMetadata,
    reader: ShardReader,
    codec: C,
    replayed: u64,
    failed: bool,
}

impl<C: ElementCodec> ReadStage<C> {
    pub(crate) fn new(metadata: RunMetadata, reader: ShardReader, codec: C) -> Self {
        ReadStage {
            metadata,
            reader,
            codec,
            replayed: 0,
            failed: false,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<C::Item> {
        self.codec.decode(bytes).map_err(|e| {
            let reason = match e {
                Error::Element(reason) => reason,
                other => other.to_string(),
            };
            Error::corruption(
                format!("run {} element {}", self.metadata.fingerprint, self.replayed),
                format!("stored element does not decode: {}", reason),
            )
        })
    }

    /// Finalized record being replayed
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }
}

impl<C: ElementCodec> Iterator for ReadStage<C> {
    type Item = Result<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.reader.next()?.and_then(|bytes| self.decode(&bytes));
        if result.is_ok() {
            self.replayed += 1;
        }
        if let Err(e) = &result {
            self.failed = true;
            warn!(
                target: "stratacache::stage",
                fingerprint = %self.metadata.fingerprint,
                error = %e,
                "Snapshot replay failed"
            );
        }
        Some(result)
    }
}

enum WriteState {
    Streaming,
    // Claim taken over; elements pass through unpersisted
    Detached,
    Finalized,
    Ended,
    Failed,
}

/// Persists source elements while yielding them
pub struct WriteThrough<P: Pipeline, C> {
    source: P::Elements,
    codec: C,
    writer: ShardWriter,
    store: MetadataStore,
    fingerprint: Fingerprint,
    owner: OwnerId,
    state: WriteState,
}

impl<P, C> WriteThrough<P, C>
where
    P: Pipeline,
    C: ElementCodec<Item = P::Item>,
{
    pub(crate) fn new(
        source: P::Elements,
        codec: C,
        writer: ShardWriter,
        store: MetadataStore,
        fingerprint: Fingerprint,
        owner: OwnerId,
    ) -> Self {
        WriteThrough {
            source,
            codec,
            writer,
            store,
            fingerprint,
            owner,
            state: WriteState::Streaming,
        }
    }

    /// Owner holding the claim
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Check if the run has been finalized
    pub fn is_finalized(&self) -> bool {
        matches!(self.state, WriteState::Finalized)
    }

    /// Check if another owner took the run over from this stage
    pub fn is_superseded(&self) -> bool {
        matches!(self.state, WriteState::Detached | WriteState::Ended)
    }

    fn fail(&mut self, error: Error) -> Option<Result<P::Item>> {
        self.state = WriteState::Failed;
        warn!(
            target: "stratacache::stage",
            fingerprint = %self.fingerprint,
            owner = %self.owner,
            error = %error,
            "Snapshot write abandoned, run left unfinalized"
        );
        Some(Err(error))
    }

    // A record naming another owner means our claim expired and was taken.
    fn claim_taken_over(&self, error: &Error) -> bool {
        if matches!(error, Error::ClaimLost { .. }) {
            return true;
        }
        matches!(
            self.store.load(&self.fingerprint),
            Ok(Some(record)) if record.owner != self.owner
        )
    }

    fn detach(&mut self, error: &Error) {
        warn!(
            target: "stratacache::stage",
            fingerprint = %self.fingerprint,
            owner = %self.owner,
            error = %error,
            "Claim taken over by another owner, dropping written shards"
        );
        self.state = WriteState::Detached;
        self.discard_shards();
    }

    fn discard_shards(&mut self) {
        if let Err(e) = self.writer.discard() {
            warn!(
                target: "stratacache::stage",
                fingerprint = %self.fingerprint,
                owner = %self.owner,
                error = %e,
                "Failed to remove shards"
            );
        }
    }

    fn persist(&mut self, item: &P::Item) -> Result<()> {
        let bytes = self.codec.encode(item)?;
        self.writer.append(&bytes)
    }

    fn finalize(&mut self) -> Result<()> {
        let shards = self.writer.finish()?;
        let metadata = self.store.finalize(&self.fingerprint, self.owner, shards)?;
        info!(
            target: "stratacache::stage",
            fingerprint = %self.fingerprint,
            shards = metadata.shards().len(),
            elements = metadata.element_count().unwrap_or(0),
            "Snapshot written"
        );
        Ok(())
    }
}

impl<P, C> Iterator for WriteThrough<P, C>
where
    P: Pipeline,
    C: ElementCodec<Item = P::Item>,
{
    type Item = Result<P::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let persisting = match self.state {
            WriteState::Streaming => true,
            WriteState::Detached => false,
            _ => return None,
        };
        match self.source.next() {
            Some(Ok(item)) => {
                if persisting {
                    if let Err(e) = self.persist(&item) {
                        if !self.claim_taken_over(&e) {
                            self.discard_shards();
                            return self.fail(e);
                        }
                        self.detach(&e);
                    }
                }
                Some(Ok(item))
            }
            Some(Err(e)) => {
                if persisting {
                    self.discard_shards();
                }
                self.fail(Error::from_source(e))
            }
            None if !persisting => {
                self.state = WriteState::Ended;
                None
            }
            None => match self.finalize() {
                Ok(()) => {
                    self.state = WriteState::Finalized;
                    None
                }
                Err(e) if self.claim_taken_over(&e) => {
                    self.detach(&e);
                    self.state = WriteState::Ended;
                    None
                }
                Err(e) => self.fail(e),
            },
        }
    }
}

impl<P: Pipeline, C> Drop for WriteThrough<P, C> {
    fn drop(&mut self) {
        if matches!(self.state, WriteState::Streaming) {
            debug!(
                target: "stratacache::stage",
                fingerprint = %self.fingerprint,
                owner = %self.owner,
                "Snapshot stage dropped before the source was exhausted, run left unfinalized"
            );
            if let Err(e) = self.writer.discard() {
                warn!(
                    target: "stratacache::stage",
                    fingerprint = %self.fingerprint,
                    owner = %self.owner,
                    error = %e,
                    "Failed to remove shards"
                );
            }
        }
    }
}

/// Serves source elements directly
pub struct PassthroughStage<P: Pipeline> {
    source: P::Elements,
    fingerprint: Fingerprint,
    reason: PassthroughReason,
    failed: bool,
}

impl<P: Pipeline> PassthroughStage<P> {
    pub(crate) fn new(source: P::Elements, fingerprint: Fingerprint, reason: PassthroughReason) -> Self {
        PassthroughStage {
            source,
            fingerprint,
            reason,
            failed: false,
        }
    }

    /// Why elements are passed through
    pub fn reason(&self) -> PassthroughReason {
        self.reason
    }
}

impl<P: Pipeline> Iterator for PassthroughStage<P> {
    type Item = Result<P::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.source.next()? {
            Ok(item) => Some(Ok(item)),
            Err(e) => {
                self.failed = true;
                Some(Err(Error::from_source(e)))
            }
        }
    }
}
