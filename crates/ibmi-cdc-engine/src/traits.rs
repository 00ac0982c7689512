//! Collaborator traits: the host the engine reads from and the sink it
//! emits to.

use crate::error::{HostError, SinkError};
use crate::event::ChangeEvent;
use ibmi_cdc_journal::RetrievalRequest;
use ibmi_cdc_model::{DetailedJournalReceiver, JournalId, JournalPosition};

/// Connection to the IBM i host.
///
/// Implementations own transport, authentication and timeouts. The engine
/// makes one call at a time.
pub trait HostConnection {
    /// Runs one journal retrieval and returns the raw response buffer.
    ///
    /// # Errors
    ///
    /// [`HostError::PositionUnavailable`] when the start position no longer
    /// exists; any other variant ends the poll.
    fn retrieve_entries(
        &mut self,
        journal: &JournalId,
        request: &RetrievalRequest,
    ) -> Result<Vec<u8>, HostError>;

    /// Lists every receiver the journal knows about, in any order.
    fn list_receivers(
        &mut self,
        journal: &JournalId,
    ) -> Result<Vec<DetailedJournalReceiver>, HostError>;

    /// Returns the newest position of the journal (attached receiver).
    fn current_position(&mut self, journal: &JournalId) -> Result<JournalPosition, HostError>;
}

impl<H: HostConnection + ?Sized> HostConnection for Box<H> {
    fn retrieve_entries(
        &mut self,
        journal: &JournalId,
        request: &RetrievalRequest,
    ) -> Result<Vec<u8>, HostError> {
        (**self).retrieve_entries(journal, request)
    }

    fn list_receivers(
        &mut self,
        journal: &JournalId,
    ) -> Result<Vec<DetailedJournalReceiver>, HostError> {
        (**self).list_receivers(journal)
    }

    fn current_position(&mut self, journal: &JournalId) -> Result<JournalPosition, HostError> {
        (**self).current_position(journal)
    }
}

/// Consumer of change events.
///
/// The engine advances its checkpoint past an entry only after `accept`
/// returns `Ok`.
pub trait EntrySink {
    /// Handles one event.
    fn accept(&mut self, event: &ChangeEvent) -> Result<(), SinkError>;
}

impl EntrySink for Vec<ChangeEvent> {
    fn accept(&mut self, event: &ChangeEvent) -> Result<(), SinkError> {
        self.push(event.clone());
        Ok(())
    }
}
