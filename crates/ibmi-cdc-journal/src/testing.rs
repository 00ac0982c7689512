//! Builders for synthetic retrieval responses.
//!
//! Only compiled for tests and under the `test-support` feature; fake hosts
//! in other crates use these to serve realistic buffers.

use crate::entry::{EntryHeader, JournalObject};
use crate::errors::DecodeError;
use crate::header::{FirstHeader, OffsetStatus};
use crate::receiver::{ReceiverName, RECEIVER_NAME};
use crate::text::Ccsid;
use chrono::{DateTime, Utc};
use ibmi_cdc_model::{JournalProcessedPosition, JournalReceiver};

const ESD_PREFIX: usize = 16;

/// One entry to place in a synthetic response.
#[derive(Debug, Clone)]
pub struct EntrySpec {
    header: EntryHeader,
    data: Option<Vec<u8>>,
    nulls: Vec<u8>,
}

impl EntrySpec {
    /// A record-level entry for `library/file` with an empty row image.
    pub fn row(code: &str, entry_type: &str, sequence: u64, library: &str, file: &str) -> Self {
        let mut spec = Self::control(code, entry_type, sequence);
        spec.header.object = JournalObject {
            file: file.to_string(),
            library: library.to_string(),
            member: file.to_string(),
        };
        spec.data = Some(Vec::new());
        spec
    }

    /// An entry that names no object.
    pub fn control(code: &str, entry_type: &str, sequence: u64) -> Self {
        Self {
            header: EntryHeader {
                sequence_number: sequence,
                journal_code: code.to_string(),
                entry_type: entry_type.to_string(),
                job_name: "QZDASOINIT".to_string(),
                user_name: "QUSER".to_string(),
                job_number: "123456".to_string(),
                system_name: "TESTSYS".to_string(),
                ..Default::default()
            },
            data: None,
            nulls: Vec::new(),
        }
    }

    /// Sets the row image.
    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.data = Some(bytes.to_vec());
        self
    }

    /// Sets the null value indicators.
    pub fn nulls(mut self, bytes: &[u8]) -> Self {
        self.nulls = bytes.to_vec();
        self
    }

    /// Names the receiver holding the entry.
    pub fn receiver(mut self, receiver: JournalReceiver) -> Self {
        self.header.receiver = Some(ReceiverName {
            receiver,
            asp_device: String::new(),
            asp_number: 1,
        });
        self
    }

    /// Sets the entry time.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.header.timestamp = Some(timestamp);
        self
    }

    fn encode(&self, last: bool, ccsid: Ccsid) -> Result<Vec<u8>, DecodeError> {
        let mut header = self.header.clone();
        let mut tail = Vec::new();
        let mut position = EntryHeader::LENGTH;

        if let Some(receiver) = &header.receiver {
            header.receiver_info_offset = position as u32;
            tail.extend(receiver.encode(ccsid)?);
            position += RECEIVER_NAME.length;
        }
        if !self.nulls.is_empty() {
            header.null_indicator_offset = position as u32;
            tail.extend((self.nulls.len() as u32).to_be_bytes());
            tail.extend(&self.nulls);
            position += 4 + self.nulls.len();
        }
        if let Some(data) = &self.data {
            if data.len() > 99_999 {
                return Err(DecodeError::FieldOverflow {
                    field: "entry_specific_data_length",
                    value: data.len().to_string(),
                    width: 5,
                });
            }
            header.entry_specific_data_offset = position as u32;
            tail.extend(ccsid.encode_padded(&format!("{:05}", data.len()), 5));
            tail.extend(std::iter::repeat(0u8).take(ESD_PREFIX - 5));
            tail.extend(data);
            position += ESD_PREFIX + data.len();
        }
        header.next_entry_offset = if last { 0 } else { position as u32 };

        let mut bytes = header.encode(ccsid)?;
        bytes.extend(tail);
        Ok(bytes)
    }
}

/// Builds a complete retrieval response.
#[derive(Debug, Clone)]
pub struct BufferBuilder {
    ccsid: Ccsid,
    entries: Vec<EntrySpec>,
    continuation: Option<JournalProcessedPosition>,
}

impl BufferBuilder {
    /// Starts an empty response.
    pub fn new(ccsid: Ccsid) -> Self {
        Self {
            ccsid,
            entries: Vec::new(),
            continuation: None,
        }
    }

    /// Appends an entry.
    pub fn entry(mut self, entry: EntrySpec) -> Self {
        self.entries.push(entry);
        self
    }

    /// Marks the response as having more data from `position`.
    pub fn continuation(mut self, position: JournalProcessedPosition) -> Self {
        self.continuation = Some(position);
        self
    }

    /// Encodes the response.
    pub fn build(&self) -> Result<Vec<u8>, DecodeError> {
        let mut body = Vec::new();
        let count = self.entries.len();
        for (index, entry) in self.entries.iter().enumerate() {
            body.extend(entry.encode(index + 1 == count, self.ccsid)?);
        }

        let status = match (&self.continuation, count) {
            (Some(_), _) => OffsetStatus::MoreDataNewOffset,
            (None, 0) => OffsetStatus::NoData,
            (None, _) => OffsetStatus::Data,
        };
        let header = FirstHeader {
            total_bytes: (FirstHeader::LENGTH + body.len()) as u32,
            offset_to_first_entry: if count == 0 { 0 } else { FirstHeader::LENGTH as u32 },
            entry_count: count as u32,
            status,
            continuation: self.continuation.clone(),
        };

        let mut bytes = header.encode(self.ccsid)?;
        bytes.extend(body);
        Ok(bytes)
    }
}
