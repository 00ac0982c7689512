//! Change events handed to sinks.

use chrono::{DateTime, Utc};
use ibmi_cdc_journal::{JournalEntry, JournalEntryType, RowOperation};
use ibmi_cdc_model::JournalProcessedPosition;
use serde::{Serialize, Serializer};

/// One classified journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// Entry class.
    pub entry_type: JournalEntryType,
    /// Row-level effect for record entries.
    pub row_operation: Option<RowOperation>,
    /// `LIBRARY.FILE` for entries that name a table.
    pub table: Option<String>,
    /// Member name for entries that name a table.
    pub member: Option<String>,
    /// Journal sequence number.
    pub sequence_number: u64,
    /// Host time of the entry.
    pub timestamp: Option<DateTime<Utc>>,
    /// Commitment cycle, zero outside commitment control.
    pub commit_cycle_id: u64,
    /// Row image as the host stored it.
    #[serde(serialize_with = "as_hex")]
    pub row_bytes: Vec<u8>,
    /// Null value indicators.
    #[serde(serialize_with = "as_hex")]
    pub null_indicators: Vec<u8>,
    /// Checkpoint that records this entry as applied.
    pub checkpoint: JournalProcessedPosition,
}

impl ChangeEvent {
    /// Builds the event for `entry`.
    pub fn from_entry(
        entry_type: JournalEntryType,
        entry: &JournalEntry<'_>,
        checkpoint: JournalProcessedPosition,
    ) -> Self {
        let object = &entry.header.object;
        let (table, member) = if entry_type.is_table_scoped() && !object.is_empty() {
            let member = (!object.member.is_empty()).then(|| object.member.clone());
            (Some(object.qualified_table()), member)
        } else {
            (None, None)
        };

        Self {
            entry_type,
            row_operation: entry_type.row_operation(),
            table,
            member,
            sequence_number: entry.header.sequence_number,
            timestamp: entry.header.timestamp,
            commit_cycle_id: entry.header.commit_cycle_id,
            row_bytes: entry.row_data().to_vec(),
            null_indicators: entry.null_indicators().to_vec(),
            checkpoint,
        }
    }
}

fn as_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode_upper(bytes))
}
