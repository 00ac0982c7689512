//! Key records: the variable-length selection list carried by a retrieval
//! request.
//!
//! A key list is a `u32` record count followed by records, each a 12-byte
//! header (record length, key, data length) and its data. The record length
//! covers header, data and any padding, so readers step by it rather than by
//! the data length.

use crate::errors::DecodeError;
use crate::layout::{Field, FieldKind, FieldReader, FieldWriter, Layout};
use crate::text::Ccsid;
use ibmi_cdc_model::{parse_offset, JournalPosition, JournalProcessedPosition, JournalReceiver};
use serde::Serialize;

/// Field table of a key record header.
pub mod fields {
    use super::*;

    /// Length of the whole record.
    pub const RECORD_LENGTH: Field = Field::new("record_length", 0, 4, FieldKind::Unsigned);
    /// Key identifying the data.
    pub const KEY: Field = Field::new("key", 4, 4, FieldKind::Unsigned);
    /// Length of the data following the header.
    pub const DATA_LENGTH: Field = Field::new("data_length", 8, 4, FieldKind::Unsigned);
}

/// Layout of a key record header.
pub const KEY_HEADER: Layout = Layout {
    name: "key header",
    length: 12,
    fields: &[fields::RECORD_LENGTH, fields::KEY, fields::DATA_LENGTH],
};

const COUNT_WIDTH: usize = 4;
const NAME_WIDTH: usize = 10;
const SEQUENCE_WIDTH: usize = 20;

/// Selection keys understood by the retrieval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SelectionKey {
    /// 1: receiver range.
    ReceiverRange,
    /// 2: starting sequence number.
    FromEntry,
    /// 6: maximum number of entries.
    NumberOfEntries,
    /// 7: journal codes.
    JournalCodes,
    /// 8: entry types.
    EntryTypes,
    /// 16: files.
    Files,
    /// Any other key, carried through unchanged.
    Other(u32),
}

impl SelectionKey {
    /// Maps a numeric key.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => SelectionKey::ReceiverRange,
            2 => SelectionKey::FromEntry,
            6 => SelectionKey::NumberOfEntries,
            7 => SelectionKey::JournalCodes,
            8 => SelectionKey::EntryTypes,
            16 => SelectionKey::Files,
            other => SelectionKey::Other(other),
        }
    }

    /// Numeric key.
    pub fn code(self) -> u32 {
        match self {
            SelectionKey::ReceiverRange => 1,
            SelectionKey::FromEntry => 2,
            SelectionKey::NumberOfEntries => 6,
            SelectionKey::JournalCodes => 7,
            SelectionKey::EntryTypes => 8,
            SelectionKey::Files => 16,
            SelectionKey::Other(code) => code,
        }
    }
}

/// One key record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRecord {
    /// Key.
    pub key: SelectionKey,
    /// Data bytes.
    pub data: Vec<u8>,
}

impl KeyRecord {
    /// Encodes the record, padding its length to a multiple of four.
    pub fn encode(&self) -> Result<Vec<u8>, DecodeError> {
        let record_length = (KEY_HEADER.length + self.data.len()).next_multiple_of(4);
        let mut writer = FieldWriter::new(&KEY_HEADER, Ccsid::default());
        writer
            .unsigned(&fields::RECORD_LENGTH, record_length as u64)?
            .unsigned(&fields::KEY, u64::from(self.key.code()))?
            .unsigned(&fields::DATA_LENGTH, self.data.len() as u64)?;
        let mut bytes = writer.finish();
        bytes.extend_from_slice(&self.data);
        bytes.resize(record_length, 0);
        Ok(bytes)
    }
}

/// Encodes a key list.
pub fn encode_key_list(records: &[KeyRecord]) -> Result<Vec<u8>, DecodeError> {
    let count = u32::try_from(records.len()).map_err(|_| DecodeError::FieldOverflow {
        field: "record_count",
        value: records.len().to_string(),
        width: COUNT_WIDTH,
    })?;
    let mut bytes = count.to_be_bytes().to_vec();
    for record in records {
        bytes.extend(record.encode()?);
    }
    Ok(bytes)
}

/// Decodes a key list starting at `base`.
pub fn decode_key_list(buffer: &[u8], base: usize) -> Result<Vec<KeyRecord>, DecodeError> {
    let count_bytes = base
        .checked_add(COUNT_WIDTH)
        .and_then(|end| buffer.get(base..end))
        .ok_or(DecodeError::BufferTooShort {
            structure: "key list",
            offset: base,
            needed: COUNT_WIDTH,
            available: buffer.len().saturating_sub(base),
        })?;
    let count = u32::from_be_bytes([count_bytes[0], count_bytes[1], count_bytes[2], count_bytes[3]]);

    let mut records = Vec::new();
    let mut position = base + COUNT_WIDTH;
    for _ in 0..count {
        let reader = FieldReader::new(&KEY_HEADER, buffer, position, Ccsid::default())?;
        let record_length = reader.unsigned(&fields::RECORD_LENGTH) as usize;
        let data_length = reader.unsigned(&fields::DATA_LENGTH) as usize;
        if record_length < KEY_HEADER.length.saturating_add(data_length) {
            return Err(DecodeError::InvalidEntryChain {
                offset: position,
                reason: format!(
                    "record length {} cannot hold {} data bytes",
                    record_length, data_length
                ),
            });
        }
        let data_start = position + KEY_HEADER.length;
        let data = buffer
            .get(data_start..data_start + data_length)
            .ok_or(DecodeError::BufferTooShort {
                structure: "key data",
                offset: data_start,
                needed: data_length,
                available: buffer.len().saturating_sub(data_start),
            })?;
        records.push(KeyRecord {
            key: SelectionKey::from_code(reader.u32(&fields::KEY)),
            data: data.to_vec(),
        });
        position += record_length;
    }
    Ok(records)
}

/// A file named in a retrieval request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSelection {
    /// File name.
    pub file: String,
    /// Library name.
    pub library: String,
    /// Member name, `*ALL` for every member.
    pub member: String,
}

impl FileSelection {
    /// Selects every member of `library/file`.
    pub fn all_members(library: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            library: library.into(),
            member: "*ALL".to_string(),
        }
    }
}

/// A journal retrieval request.
///
/// Server-side selection (codes, types, files) only narrows what the host
/// sends; callers still filter every entry they receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalRequest {
    /// Where to start; the start-of-journal sentinel reads the current chain.
    pub start: JournalPosition,
    /// Maximum entries per response.
    pub max_entries: u32,
    /// Journal codes to return; empty for all.
    pub journal_codes: Vec<String>,
    /// Entry types to return; empty for all.
    pub entry_types: Vec<String>,
    /// Files to return; empty for all.
    pub files: Vec<FileSelection>,
}

const CURRENT_CHAIN: &str = "*CURCHAIN";
const CURRENT: &str = "*CURRENT";
const FIRST: &str = "*FIRST";
const ALL_SELECTED: &str = "*ALLSEL";

impl RetrievalRequest {
    /// Builds the request that resumes from a checkpoint.
    pub fn resume(checkpoint: &JournalProcessedPosition, max_entries: u32) -> Self {
        let start = if checkpoint.is_start_of_journal() {
            JournalPosition::default()
        } else {
            checkpoint.next_to_read()
        };
        Self {
            start,
            max_entries,
            journal_codes: Vec::new(),
            entry_types: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Encodes the request as a key list in `ccsid`.
    pub fn encode(&self, ccsid: Ccsid) -> Result<Vec<u8>, DecodeError> {
        let mut records = Vec::new();

        let mut range = Vec::new();
        if self.start.is_start_of_journal() {
            range.extend(ccsid.encode_padded(CURRENT_CHAIN, NAME_WIDTH * 4));
        } else {
            range.extend(ccsid.encode_padded(self.start.receiver.name.as_ref(), NAME_WIDTH));
            range.extend(ccsid.encode_padded(self.start.receiver.library.as_ref(), NAME_WIDTH));
            range.extend(ccsid.encode_padded(CURRENT, NAME_WIDTH * 2));
        }
        records.push(KeyRecord {
            key: SelectionKey::ReceiverRange,
            data: range,
        });

        let from = if self.start.is_start_of_journal() {
            FIRST.to_string()
        } else {
            let digits = self.start.offset.to_str_radix(10);
            if digits.len() > SEQUENCE_WIDTH {
                return Err(DecodeError::FieldOverflow {
                    field: "from_entry",
                    value: digits,
                    width: SEQUENCE_WIDTH,
                });
            }
            format!("{:0>w$}", digits, w = SEQUENCE_WIDTH)
        };
        records.push(KeyRecord {
            key: SelectionKey::FromEntry,
            data: ccsid.encode_padded(&from, SEQUENCE_WIDTH),
        });

        records.push(KeyRecord {
            key: SelectionKey::NumberOfEntries,
            data: self.max_entries.to_be_bytes().to_vec(),
        });

        if !self.journal_codes.is_empty() {
            let mut data = count_prefix(self.journal_codes.len())?;
            for code in &self.journal_codes {
                data.extend(ccsid.encode_padded(code, NAME_WIDTH));
                data.extend(ccsid.encode_padded(ALL_SELECTED, NAME_WIDTH));
            }
            records.push(KeyRecord {
                key: SelectionKey::JournalCodes,
                data,
            });
        }

        if !self.entry_types.is_empty() {
            let mut data = count_prefix(self.entry_types.len())?;
            for entry_type in &self.entry_types {
                data.extend(ccsid.encode_padded(entry_type, NAME_WIDTH));
            }
            records.push(KeyRecord {
                key: SelectionKey::EntryTypes,
                data,
            });
        }

        if !self.files.is_empty() {
            let mut data = count_prefix(self.files.len())?;
            for file in &self.files {
                data.extend(ccsid.encode_padded(&file.file, NAME_WIDTH));
                data.extend(ccsid.encode_padded(&file.library, NAME_WIDTH));
                data.extend(ccsid.encode_padded(&file.member, NAME_WIDTH));
            }
            records.push(KeyRecord {
                key: SelectionKey::Files,
                data,
            });
        }

        encode_key_list(&records)
    }

    /// Decodes a request encoded by [`RetrievalRequest::encode`]. Unknown keys
    /// are ignored.
    pub fn decode(buffer: &[u8], ccsid: Ccsid) -> Result<Self, DecodeError> {
        let mut request = Self {
            start: JournalPosition::default(),
            max_entries: 0,
            journal_codes: Vec::new(),
            entry_types: Vec::new(),
            files: Vec::new(),
        };
        let text = |bytes: &[u8]| ccsid.decode(bytes).trim().to_string();
        let char_width = ccsid.encode(" ").len();
        let name = NAME_WIDTH * char_width;

        for record in decode_key_list(buffer, 0)? {
            let data = record.data.as_slice();
            match record.key {
                SelectionKey::ReceiverRange => {
                    let receiver = text(data.get(..name).unwrap_or_default());
                    if receiver != CURRENT_CHAIN {
                        let library = text(data.get(name..name * 2).unwrap_or_default());
                        request.start.receiver = JournalReceiver::new(receiver, library);
                    }
                }
                SelectionKey::FromEntry => {
                    let from = text(data);
                    if from != FIRST {
                        request.start.offset =
                            parse_offset(&from).map_err(|_| DecodeError::InvalidField {
                                structure: "retrieval request",
                                field: "from_entry",
                                offset: 0,
                                value: from.clone(),
                            })?;
                    }
                }
                SelectionKey::NumberOfEntries => {
                    let raw: [u8; 4] = data.get(..4).and_then(|b| b.try_into().ok()).ok_or(
                        DecodeError::BufferTooShort {
                            structure: "number of entries",
                            offset: 0,
                            needed: 4,
                            available: data.len(),
                        },
                    )?;
                    request.max_entries = u32::from_be_bytes(raw);
                }
                SelectionKey::JournalCodes => {
                    request.journal_codes = data
                        .get(COUNT_WIDTH..)
                        .unwrap_or_default()
                        .chunks(name * 2)
                        .map(|chunk| text(chunk.get(..name).unwrap_or(chunk)))
                        .collect();
                }
                SelectionKey::EntryTypes => {
                    request.entry_types = data
                        .get(COUNT_WIDTH..)
                        .unwrap_or_default()
                        .chunks(name)
                        .map(text)
                        .collect();
                }
                SelectionKey::Files => {
                    request.files = data
                        .get(COUNT_WIDTH..)
                        .unwrap_or_default()
                        .chunks(name * 3)
                        .map(|chunk| FileSelection {
                            file: text(chunk.get(..name).unwrap_or_default()),
                            library: text(chunk.get(name..name * 2).unwrap_or_default()),
                            member: text(chunk.get(name * 2..).unwrap_or_default()),
                        })
                        .collect();
                }
                SelectionKey::Other(_) => {}
            }
        }
        Ok(request)
    }
}

fn count_prefix(len: usize) -> Result<Vec<u8>, DecodeError> {
    let count = u32::try_from(len).map_err(|_| DecodeError::FieldOverflow {
        field: "selection_count",
        value: len.to_string(),
        width: COUNT_WIDTH,
    })?;
    Ok(count.to_be_bytes().to_vec())
}
