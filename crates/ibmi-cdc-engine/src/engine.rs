//! The retrieval engine.
//!
//! One engine owns one checkpoint and moves it forward through a journal:
//!
//! ```text
//! AwaitingCall -> Decoding -> Emitting -> AwaitingCall   (more data on the host)
//!                          \-> Exhausted                 (caught up, maybe rolled over)
//!            \-> LostJournal                             (position gone; hard stop)
//! ```
//!
//! The checkpoint only moves past an entry once the sink has accepted it
//! (or the entry was skipped). It never moves past bytes that failed to
//! decode.

use crate::chain::{available_receivers, link_chain, unreachable};
use crate::checkpoint::CheckpointFile;
use crate::error::{EngineError, HostError};
use crate::event::ChangeEvent;
use crate::filter::{EntryFilter, IncludeFilter};
use crate::traits::{EntrySink, HostConnection};
use crate::watchdog::{CancellationToken, Heartbeat, Watchdog};
use ibmi_cdc_journal::diagnostics;
use ibmi_cdc_journal::{
    Ccsid, DecodeError, EntryBuffer, FileSelection, OffsetStatus, ReadMode, RetrievalRequest,
};
use ibmi_cdc_model::{
    BigUint, DetailedJournalReceiver, JournalId, JournalPosition, JournalProcessedPosition,
    JournalReceiver,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Tuning for a [`RetrievalEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Text encoding of host buffers.
    pub ccsid: Ccsid,
    /// Entries requested per retrieval call.
    pub max_entries_per_call: u32,
    /// Retrieval calls per poll before yielding with `more_available`.
    pub max_pages_per_poll: u32,
    /// Folder for malformed buffer dumps.
    pub dump_folder: Option<PathBuf>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            ccsid: Ccsid::Ebcdic37,
            max_entries_per_call: crate::config::DEFAULT_MAX_ENTRIES_PER_CALL,
            max_pages_per_poll: crate::config::DEFAULT_MAX_PAGES_PER_POLL,
            dump_folder: None,
        }
    }
}

/// Where the engine is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    /// About to call the host.
    AwaitingCall,
    /// Decoding a response.
    Decoding,
    /// Handing entries to the sink.
    Emitting,
    /// The host has nothing newer than the checkpoint.
    Exhausted,
    /// The checkpoint position no longer exists; polling is halted until
    /// [`RetrievalEngine::acknowledge_resync`].
    LostJournal,
}

/// Details of a lost journal position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LostJournalReport {
    /// The checkpoint that could not be resumed.
    pub checkpoint: JournalProcessedPosition,
    /// Receiver attached when the loss was detected, if the host said.
    pub attached: Option<JournalReceiver>,
    /// Whether the attached receiver differs from the checkpoint receiver.
    pub diverged: bool,
    /// Host or engine explanation.
    pub reason: String,
}

/// Result of one [`RetrievalEngine::poll`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PollOutcome {
    /// Nothing new on the host.
    CaughtUp,
    /// Entries were read.
    Advanced {
        /// Entries handed to the sink.
        entries_emitted: usize,
        /// Unclassified or filtered entries.
        entries_skipped: usize,
        /// The page cap stopped pagination; poll again without waiting.
        more_available: bool,
    },
    /// The checkpoint receiver was drained and the checkpoint moved to its
    /// successor.
    Rolled {
        /// Drained receiver.
        from: JournalReceiver,
        /// Successor now being read.
        to: JournalReceiver,
    },
    /// The checkpoint position was lost. The checkpoint has been reset to
    /// the start of the journal and the engine is halted.
    LostJournal(LostJournalReport),
}

/// Forward-only cursor over one journal.
///
/// # Example
///
/// ```rust,ignore
/// use ibmi_cdc_engine::{CheckpointFile, EngineOptions, PollOutcome, RetrievalEngine};
///
/// let file = CheckpointFile::new("orders.json");
/// let mut engine = RetrievalEngine::new(host, journal, file.load_or_start()?, EngineOptions::default());
/// let mut events = Vec::new();
/// loop {
///     match engine.poll_and_persist(&mut events, &file)? {
///         PollOutcome::CaughtUp => break,
///         PollOutcome::LostJournal(report) => panic!("resync needed: {}", report.reason),
///         _ => {}
///     }
/// }
/// ```
pub struct RetrievalEngine<H> {
    host: H,
    journal: JournalId,
    checkpoint: JournalProcessedPosition,
    options: EngineOptions,
    selections: Vec<FileSelection>,
    filter: Box<dyn EntryFilter + Send>,
    state: EngineState,
    cancel: Option<CancellationToken>,
    heartbeat: Option<Heartbeat>,
}

#[derive(Debug, Default)]
struct Tally {
    emitted: usize,
    skipped: usize,
    pages: u32,
}

impl Tally {
    fn advanced(&self, more_available: bool) -> PollOutcome {
        PollOutcome::Advanced {
            entries_emitted: self.emitted,
            entries_skipped: self.skipped,
            more_available,
        }
    }
}

impl<H: HostConnection> RetrievalEngine<H> {
    /// Creates an engine resuming from `checkpoint`.
    pub fn new(
        host: H,
        journal: JournalId,
        checkpoint: JournalProcessedPosition,
        options: EngineOptions,
    ) -> Self {
        Self {
            host,
            journal,
            checkpoint,
            options,
            selections: Vec::new(),
            filter: Box::new(IncludeFilter::default()),
            state: EngineState::AwaitingCall,
            cancel: None,
            heartbeat: None,
        }
    }

    /// Restricts capture to the include list, both in the request and
    /// client side.
    pub fn with_include(mut self, include: IncludeFilter) -> Self {
        self.selections = include.selections();
        self.filter = Box::new(include);
        self
    }

    /// Replaces the client-side filter. Request selections are unchanged.
    pub fn with_filter<F: EntryFilter + Send + 'static>(mut self, filter: F) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Reports progress to `watchdog` and stops when it trips.
    pub fn with_watchdog(self, watchdog: &Watchdog) -> Self {
        self.with_cancellation(watchdog.token(), watchdog.heartbeat())
    }

    /// Reports progress to `heartbeat` and stops when `token` trips.
    pub fn with_cancellation(mut self, token: CancellationToken, heartbeat: Heartbeat) -> Self {
        self.cancel = Some(token);
        self.heartbeat = Some(heartbeat);
        self
    }

    /// Current checkpoint.
    pub fn checkpoint(&self) -> &JournalProcessedPosition {
        &self.checkpoint
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Journal being read.
    pub fn journal(&self) -> &JournalId {
        &self.journal
    }

    /// The host connection.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Clears the lost-journal halt. Polling resumes from the start of the
    /// current chain.
    pub fn acknowledge_resync(&mut self) {
        if self.state == EngineState::LostJournal {
            info!(journal = %self.journal, "resync acknowledged");
            self.state = EngineState::AwaitingCall;
        }
    }

    /// Polls, then persists the checkpoint, even when the poll failed part
    /// way through a page.
    pub fn poll_and_persist<S: EntrySink + ?Sized>(
        &mut self,
        sink: &mut S,
        file: &CheckpointFile,
    ) -> Result<PollOutcome, EngineError> {
        let result = self.poll(sink);
        if !matches!(result, Err(EngineError::ResyncRequired)) {
            file.store(&self.checkpoint)?;
        }
        result
    }

    /// Reads until caught up, the page cap is hit, the receiver rolls over
    /// or the position is lost.
    ///
    /// # Errors
    ///
    /// [`EngineError::ResyncRequired`] after a lost journal until
    /// acknowledged; [`EngineError::Cancelled`] when the token trips;
    /// otherwise host, decode, chain and sink failures. The checkpoint keeps
    /// every entry accepted before the failure.
    pub fn poll<S: EntrySink + ?Sized>(&mut self, sink: &mut S) -> Result<PollOutcome, EngineError> {
        if self.state == EngineState::LostJournal {
            return Err(EngineError::ResyncRequired);
        }
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.enter();
        }
        let result = self.run(sink);
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.leave();
        }
        if matches!(result, Err(EngineError::Cancelled)) {
            warn!(journal = %self.journal, checkpoint = %self.checkpoint, "poll cancelled");
            self.state = EngineState::AwaitingCall;
        }
        result
    }

    fn run<S: EntrySink + ?Sized>(&mut self, sink: &mut S) -> Result<PollOutcome, EngineError> {
        let mut tally = Tally::default();
        let mut listing = None;
        loop {
            self.transition(EngineState::AwaitingCall);
            self.check_cancelled()?;

            let mut request =
                RetrievalRequest::resume(&self.checkpoint, self.options.max_entries_per_call);
            request.files = self.selections.clone();

            let bytes = match self.host.retrieve_entries(&self.journal, &request) {
                Ok(bytes) => bytes,
                Err(HostError::PositionUnavailable { position, reason }) => {
                    let reason = format!("{} is unavailable: {}", position, reason);
                    return self.lost_journal(reason, None);
                }
                Err(e) => return Err(e.into()),
            };
            tally.pages += 1;

            self.transition(EngineState::Decoding);
            let buffer = match EntryBuffer::try_parse(bytes, self.options.ccsid) {
                Ok(buffer) => buffer,
                Err((e, bytes)) => {
                    self.dump_malformed(&bytes, &e);
                    return Err(e.into());
                }
            };
            let header = buffer.header().clone();
            debug!(
                journal = %self.journal,
                page = tally.pages,
                status = ?header.status,
                entries = header.entry_count,
                "retrieved page"
            );

            if header.status == OffsetStatus::NoData {
                if tally.pages > 1 {
                    self.transition(EngineState::Exhausted);
                    return Ok(tally.advanced(false));
                }
                return self.on_no_data();
            }

            self.transition(EngineState::Emitting);
            for entry in buffer.entries(ReadMode::Strict) {
                self.check_cancelled()?;
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        self.dump_malformed(buffer.bytes(), &e);
                        return Err(e.into());
                    }
                };

                let receiver = match entry.receiver() {
                    Some(receiver) => receiver.clone(),
                    None => self.resolve_receiver(entry.header.sequence_number, &mut listing)?,
                };
                let position =
                    JournalPosition::new(receiver, BigUint::from(entry.header.sequence_number));
                let next = JournalProcessedPosition::processed_at(
                    position,
                    entry.header.timestamp.or(self.checkpoint.last_processed_time),
                );

                match entry.entry_type() {
                    None => {
                        debug!(
                            sequence = entry.header.sequence_number,
                            code = %entry.header.journal_code,
                            entry_type = %entry.header.entry_type,
                            "skipping unclassified entry"
                        );
                        tally.skipped += 1;
                    }
                    Some(class)
                        if class.is_table_scoped()
                            && !self.filter.admits(class, &entry.header.object) =>
                    {
                        debug!(
                            sequence = entry.header.sequence_number,
                            table = %entry.header.object.qualified_table(),
                            "skipping excluded table"
                        );
                        tally.skipped += 1;
                    }
                    Some(class) => {
                        let event = ChangeEvent::from_entry(class, &entry, next.clone());
                        sink.accept(&event)?;
                        tally.emitted += 1;
                    }
                }
                self.checkpoint = next;
                self.beat();
            }

            if !header.has_more() {
                self.transition(EngineState::Exhausted);
                return Ok(tally.advanced(false));
            }
            if let Some(mut continuation) = header.continuation {
                continuation.last_processed_time = self.checkpoint.last_processed_time;
                self.checkpoint = continuation;
            }
            if tally.pages >= self.options.max_pages_per_poll {
                debug!(journal = %self.journal, pages = tally.pages, "page cap reached");
                self.transition(EngineState::AwaitingCall);
                return Ok(tally.advanced(true));
            }
        }
    }

    /// Nothing new at the checkpoint: either caught up, or the checkpoint
    /// receiver is drained and its successor takes over.
    fn on_no_data(&mut self) -> Result<PollOutcome, EngineError> {
        self.transition(EngineState::Exhausted);
        if self.checkpoint.is_start_of_journal() {
            return Ok(PollOutcome::CaughtUp);
        }

        self.check_cancelled()?;
        let current = self.host.current_position(&self.journal)?;
        if &current.receiver == self.checkpoint.receiver() {
            return Ok(PollOutcome::CaughtUp);
        }

        self.check_cancelled()?;
        let listing = self.host.list_receivers(&self.journal)?;
        self.beat();
        let chains = link_chain(available_receivers(&listing))?;
        let chain = chains.chain_containing(self.checkpoint.receiver());
        if chain.is_empty() {
            let reason = format!(
                "receiver {} is no longer available",
                self.checkpoint.receiver()
            );
            return self.lost_journal(reason, Some(current.receiver));
        }

        let missing = unreachable(&listing, &chain);
        if !missing.is_empty() {
            debug!(journal = %self.journal, receivers = ?missing, "receivers outside the current chain");
        }

        let Some(index) = chain
            .iter()
            .position(|r| r.receiver() == self.checkpoint.receiver())
        else {
            return Ok(PollOutcome::CaughtUp);
        };
        let drained = if self.checkpoint.processed {
            chain[index].is_drained_at(self.checkpoint.offset())
        } else {
            self.checkpoint.offset() > &chain[index].end
        };
        let Some(successor) = chain.get(index + 1).filter(|_| drained) else {
            debug!(journal = %self.journal, checkpoint = %self.checkpoint, "receiver not drained yet");
            return Ok(PollOutcome::CaughtUp);
        };

        let from = self.checkpoint.receiver().clone();
        let to = successor.receiver().clone();
        let offset = self.checkpoint.offset();
        // A processed offset past the drained receiver's range already
        // belongs to the successor; keep it rather than rewinding.
        let mut next = if self.checkpoint.processed
            && offset > &chain[index].end
            && offset >= &successor.start
        {
            JournalProcessedPosition::processed_at(
                JournalPosition::new(to.clone(), offset.clone()),
                None,
            )
        } else {
            JournalProcessedPosition::unprocessed(JournalPosition::new(
                to.clone(),
                successor.start.clone(),
            ))
        };
        next.last_processed_time = self.checkpoint.last_processed_time;
        self.checkpoint = next;
        info!(journal = %self.journal, from = %from, to = %to, "receiver rollover");
        self.transition(EngineState::AwaitingCall);
        Ok(PollOutcome::Rolled { from, to })
    }

    /// Receiver holding `sequence`, for entries that carry no receiver
    /// record. The listing is fetched once per poll.
    ///
    /// A receiver whose range holds the sequence number wins, preferring the
    /// checkpoint receiver and then the most recently attached. Failing
    /// that, the receiver with the highest start below it (the attached
    /// receiver keeps growing after the listing was taken).
    fn resolve_receiver(
        &mut self,
        sequence: u64,
        listing: &mut Option<Vec<DetailedJournalReceiver>>,
    ) -> Result<JournalReceiver, EngineError> {
        if listing.is_none() {
            self.check_cancelled()?;
            let receivers = self.host.list_receivers(&self.journal)?;
            self.beat();
            *listing = Some(receivers);
        }
        let receivers = listing.as_deref().unwrap_or(&[]);
        let target = BigUint::from(sequence);
        let current = self.checkpoint.receiver();

        let holding = receivers
            .iter()
            .filter(|r| r.start <= target && target <= r.end)
            .max_by_key(|r| (r.receiver() == current, r.info.attach_time));
        let resolved = holding.or_else(|| {
            receivers
                .iter()
                .filter(|r| r.start <= target)
                .max_by(|a, b| a.start.cmp(&b.start))
        });

        match resolved {
            Some(receiver) => {
                debug!(
                    sequence,
                    receiver = %receiver.receiver(),
                    "resolved entry receiver from listing"
                );
                Ok(receiver.receiver().clone())
            }
            None if !current.is_empty() => Ok(current.clone()),
            None => Err(EngineError::UnresolvedReceiver { sequence }),
        }
    }

    fn lost_journal(
        &mut self,
        reason: String,
        attached: Option<JournalReceiver>,
    ) -> Result<PollOutcome, EngineError> {
        self.transition(EngineState::LostJournal);
        let attached = match attached {
            Some(receiver) => Some(receiver),
            None => match self.host.current_position(&self.journal) {
                Ok(position) => Some(position.receiver),
                Err(e) => {
                    warn!(journal = %self.journal, error = %e, "could not look up attached receiver");
                    None
                }
            },
        };

        let lost = std::mem::replace(
            &mut self.checkpoint,
            JournalProcessedPosition::start_of_journal(),
        );
        let diverged = attached.as_ref() != Some(lost.receiver());
        if diverged {
            warn!(
                journal = %self.journal,
                checkpoint = %lost,
                attached = ?attached.as_ref().map(ToString::to_string),
                "unrecoverable divergence: checkpoint receiver is not the attached receiver"
            );
        }
        info!(
            journal = %self.journal,
            checkpoint = %lost,
            reason = %reason,
            "journal position lost; checkpoint reset to start of journal"
        );

        Ok(PollOutcome::LostJournal(LostJournalReport {
            checkpoint: lost,
            attached,
            diverged,
            reason,
        }))
    }

    fn transition(&mut self, state: EngineState) {
        self.state = state;
        self.beat();
    }

    fn beat(&self) {
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.beat();
        }
    }

    fn check_cancelled(&self) -> Result<(), EngineError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(EngineError::Cancelled),
            _ => Ok(()),
        }
    }

    fn dump_malformed(&self, bytes: &[u8], error: &DecodeError) {
        let Some(folder) = &self.options.dump_folder else {
            return;
        };
        match diagnostics::write_dump(folder, "retrieve", bytes, self.options.ccsid) {
            Ok(path) => warn!(path = %path.display(), error = %error, "malformed buffer dumped"),
            Err(e) => warn!(folder = %folder.display(), error = %e, "failed to dump malformed buffer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.ccsid, Ccsid::Ebcdic37);
        assert_eq!(options.max_entries_per_call, 1000);
        assert_eq!(options.max_pages_per_poll, 16);
        assert!(options.dump_folder.is_none());
    }

    #[test]
    fn tally_reports_counts() {
        let tally = Tally {
            emitted: 3,
            skipped: 2,
            pages: 1,
        };
        assert_eq!(
            tally.advanced(true),
            PollOutcome::Advanced {
                entries_emitted: 3,
                entries_skipped: 2,
                more_available: true
            }
        );
    }
}
