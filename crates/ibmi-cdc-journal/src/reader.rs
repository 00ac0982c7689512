//! Entry buffer reader.

use crate::entry::EntryHeader;
use crate::entry_type::JournalEntryType;
use crate::errors::DecodeError;
use crate::header::{FirstHeader, OffsetStatus};
use crate::text::Ccsid;
use ibmi_cdc_model::JournalReceiver;

/// How the reader treats a buffer that ends early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// A chain shorter than the declared entry count, or a truncated entry,
    /// is an error.
    #[default]
    Strict,
    /// Truncation ends iteration quietly. Meant for inspecting captured
    /// buffers, never for advancing a checkpoint.
    Permissive,
}

/// One retrieval response.
///
/// The first header is decoded once on construction; entries are decoded
/// lazily by [`EntryBuffer::entries`].
///
/// # Example
///
/// ```rust,no_run
/// use ibmi_cdc_journal::{Ccsid, EntryBuffer, ReadMode};
///
/// let bytes = std::fs::read("response.bin")?;
/// let buffer = EntryBuffer::parse(bytes, Ccsid::Ebcdic37)?;
/// for entry in buffer.entries(ReadMode::Strict) {
///     let entry = entry?;
///     println!("{} {}", entry.header.sequence_number, entry.header.entry_type);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct EntryBuffer {
    data: Vec<u8>,
    ccsid: Ccsid,
    header: FirstHeader,
}

impl EntryBuffer {
    /// Decodes the first header of a response.
    pub fn parse(data: Vec<u8>, ccsid: Ccsid) -> Result<Self, DecodeError> {
        Self::try_parse(data, ccsid).map_err(|(e, _)| e)
    }

    /// Like [`EntryBuffer::parse`], but hands the bytes back on failure.
    pub fn try_parse(data: Vec<u8>, ccsid: Ccsid) -> Result<Self, (DecodeError, Vec<u8>)> {
        match FirstHeader::decode(&data, 0, ccsid) {
            Ok(header) => Ok(Self {
                data,
                ccsid,
                header,
            }),
            Err(e) => Err((e, data)),
        }
    }

    /// The response header.
    pub fn header(&self) -> &FirstHeader {
        &self.header
    }

    /// The raw response.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Text encoding of the response.
    pub fn ccsid(&self) -> Ccsid {
        self.ccsid
    }

    /// Iterates the entries in host order.
    pub fn entries(&self, mode: ReadMode) -> Entries<'_> {
        let next = match self.header.status {
            OffsetStatus::NoData => None,
            _ => Some(self.header.offset_to_first_entry as usize),
        };
        Entries {
            buffer: self,
            mode,
            next,
            seen: 0,
        }
    }
}

/// Iterator over the entries of an [`EntryBuffer`].
///
/// Stops after the entry whose next displacement is zero or after the
/// declared entry count, whichever comes first. The first error ends the
/// iteration.
#[derive(Debug)]
pub struct Entries<'a> {
    buffer: &'a EntryBuffer,
    mode: ReadMode,
    next: Option<usize>,
    seen: u32,
}

impl<'a> Entries<'a> {
    fn fail(&mut self, error: DecodeError) -> Option<Result<JournalEntry<'a>, DecodeError>> {
        self.next = None;
        match self.mode {
            ReadMode::Strict => Some(Err(error)),
            ReadMode::Permissive => None,
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<JournalEntry<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let declared = self.buffer.header.entry_count;
        let offset = self.next?;
        if self.seen >= declared {
            self.next = None;
            return None;
        }

        let data = self.buffer.data.as_slice();
        let header = match EntryHeader::decode(data, offset, self.buffer.ccsid) {
            Ok(header) => header,
            Err(error) => return self.fail(error),
        };
        self.seen += 1;

        if header.next_entry_offset == 0 {
            self.next = None;
            if self.seen < declared {
                let error = DecodeError::EntryCountMismatch {
                    declared,
                    found: self.seen,
                };
                if self.mode == ReadMode::Strict {
                    return Some(Err(error));
                }
            }
        } else {
            let next = offset + header.next_entry_offset as usize;
            if next > data.len() {
                return self.fail(DecodeError::InvalidEntryChain {
                    offset,
                    reason: format!(
                        "next entry at {} is past the end of the {}-byte buffer",
                        next,
                        data.len()
                    ),
                });
            }
            if header.next_entry_offset < EntryHeader::LENGTH as u32 && self.seen < declared {
                return self.fail(DecodeError::InvalidEntryChain {
                    offset,
                    reason: format!(
                        "next entry displacement {} overlaps the entry header",
                        header.next_entry_offset
                    ),
                });
            }
            self.next = Some(next);
        }

        let end = (offset + header.end_offset).min(data.len());
        Some(Ok(JournalEntry {
            offset,
            bytes: &data[offset..end],
            ccsid: self.buffer.ccsid,
            header,
        }))
    }
}

/// One decoded entry borrowing its bytes from the response.
#[derive(Debug, Clone)]
pub struct JournalEntry<'a> {
    /// Offset of the entry in the response.
    pub offset: usize,
    /// Decoded header.
    pub header: EntryHeader,
    bytes: &'a [u8],
    ccsid: Ccsid,
}

impl<'a> JournalEntry<'a> {
    /// The entry class, or `None` for entries the reader does not handle.
    pub fn entry_type(&self) -> Option<JournalEntryType> {
        JournalEntryType::classify(&self.header.journal_code, &self.header.entry_type)
    }

    /// The entry's bytes, header included.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Row image bytes.
    pub fn row_data(&self) -> &'a [u8] {
        self.header.entry_specific_data(self.bytes, self.ccsid)
    }

    /// Null value indicators.
    pub fn null_indicators(&self) -> &'a [u8] {
        self.header.null_indicators(self.bytes)
    }

    /// Receiver holding the entry, when the response names it.
    pub fn receiver(&self) -> Option<&JournalReceiver> {
        self.header.receiver.as_ref().map(|name| &name.receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BufferBuilder, EntrySpec};

    #[test]
    fn no_data_yields_nothing() {
        let bytes = BufferBuilder::new(Ccsid::Ebcdic37).build().unwrap();
        let buffer = EntryBuffer::parse(bytes, Ccsid::Ebcdic37).unwrap();
        assert_eq!(buffer.header().status, OffsetStatus::NoData);
        assert_eq!(buffer.entries(ReadMode::Strict).count(), 0);
    }

    #[test]
    fn short_response_hands_the_bytes_back() {
        let Err((error, bytes)) = EntryBuffer::try_parse(vec![0xF0; 12], Ccsid::Ebcdic37) else {
            panic!("a 12-byte response cannot hold a first header");
        };
        assert!(matches!(error, DecodeError::BufferTooShort { .. }));
        assert_eq!(bytes, vec![0xF0; 12]);
    }

    #[test]
    fn entries_follow_next_displacement() {
        let bytes = BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(EntrySpec::row("R", "PT", 10, "APPDATA", "ORDERS").data(b"first"))
            .entry(EntrySpec::row("R", "UP", 11, "APPDATA", "ORDERS").data(b"second row"))
            .entry(EntrySpec::control("C", "CM", 12))
            .build()
            .unwrap();
        let buffer = EntryBuffer::parse(bytes, Ccsid::Ebcdic37).unwrap();

        let entries: Vec<_> = buffer
            .entries(ReadMode::Strict)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].header.sequence_number, 10);
        assert_eq!(entries[0].row_data(), b"first");
        assert_eq!(entries[1].row_data(), b"second row");
        assert_eq!(entries[1].entry_type(), Some(JournalEntryType::AfterUpdate));
        assert_eq!(entries[2].entry_type(), Some(JournalEntryType::Commit));
        assert_eq!(entries[2].header.next_entry_offset, 0);
        assert_eq!(entries[2].offset + entries[2].bytes().len(), buffer.bytes().len());
    }

    #[test]
    fn stops_after_declared_count() {
        let mut bytes = BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(EntrySpec::control("C", "SC", 1))
            .entry(EntrySpec::control("C", "CM", 2))
            .build()
            .unwrap();
        bytes[8..12].copy_from_slice(&1u32.to_be_bytes());
        let buffer = EntryBuffer::parse(bytes, Ccsid::Ebcdic37).unwrap();
        assert_eq!(buffer.entries(ReadMode::Strict).count(), 1);
    }

    #[test]
    fn next_past_buffer_is_fatal() {
        let mut bytes = BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(EntrySpec::control("C", "SC", 1))
            .entry(EntrySpec::control("C", "CM", 2))
            .build()
            .unwrap();
        let first = FirstHeader::LENGTH;
        bytes[first..first + 4].copy_from_slice(&100_000u32.to_be_bytes());
        let buffer = EntryBuffer::parse(bytes, Ccsid::Ebcdic37).unwrap();

        let results: Vec<_> = buffer.entries(ReadMode::Strict).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(DecodeError::InvalidEntryChain { .. })));
        assert_eq!(buffer.entries(ReadMode::Permissive).count(), 0);
    }

    #[test]
    fn declared_count_beyond_chain() {
        let mut bytes = BufferBuilder::new(Ccsid::Ebcdic37)
            .entry(EntrySpec::control("C", "SC", 1))
            .build()
            .unwrap();
        bytes[8..12].copy_from_slice(&3u32.to_be_bytes());
        let buffer = EntryBuffer::parse(bytes, Ccsid::Ebcdic37).unwrap();

        let strict: Vec<_> = buffer.entries(ReadMode::Strict).collect();
        assert!(matches!(
            strict[0],
            Err(DecodeError::EntryCountMismatch { declared: 3, found: 1 })
        ));
        assert_eq!(buffer.entries(ReadMode::Permissive).count(), 1);
    }
}
