//! Retrieval response header.

use crate::errors::DecodeError;
use crate::layout::{Field, FieldKind, FieldReader, FieldWriter, Layout};
use crate::text::Ccsid;
use ibmi_cdc_model::{JournalPosition, JournalProcessedPosition, JournalReceiver};
use serde::Serialize;

/// Field table of the response header.
pub mod fields {
    use super::*;

    /// Bytes returned in the whole response.
    pub const BYTES_RETURNED: Field = Field::new("bytes_returned", 0, 4, FieldKind::Unsigned);
    /// Offset from the start of the response to the first entry header.
    pub const OFFSET_TO_FIRST_ENTRY: Field =
        Field::new("offset_to_first_entry", 4, 4, FieldKind::Unsigned);
    /// Number of entries in the response.
    pub const ENTRY_COUNT: Field = Field::new("entry_count", 8, 4, FieldKind::Unsigned);
    /// `'1'` when more entries are available from the continuation position.
    pub const CONTINUATION_INDICATOR: Field =
        Field::new("continuation_indicator", 12, 1, FieldKind::Text);
    /// Receiver to continue from.
    pub const CONTINUATION_RECEIVER: Field =
        Field::new("continuation_receiver", 13, 10, FieldKind::Text);
    /// Library of the receiver to continue from.
    pub const CONTINUATION_LIBRARY: Field =
        Field::new("continuation_library", 23, 10, FieldKind::Text);
    /// Sequence number to continue from.
    pub const CONTINUATION_SEQUENCE: Field =
        Field::new("continuation_sequence", 33, 20, FieldKind::Zoned);
    /// Reserved.
    pub const RESERVED: Field = Field::new("reserved", 53, 11, FieldKind::Bytes);
}

/// Layout of the response header.
pub const FIRST_HEADER: Layout = Layout {
    name: "first header",
    length: 64,
    fields: &[
        fields::BYTES_RETURNED,
        fields::OFFSET_TO_FIRST_ENTRY,
        fields::ENTRY_COUNT,
        fields::CONTINUATION_INDICATOR,
        fields::CONTINUATION_RECEIVER,
        fields::CONTINUATION_LIBRARY,
        fields::CONTINUATION_SEQUENCE,
        fields::RESERVED,
    ],
};

const MORE_DATA: char = '1';

/// What a response holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OffsetStatus {
    /// No entries past the requested position.
    NoData,
    /// Entries returned; the request was satisfied.
    Data,
    /// Entries returned and more remain from the continuation position.
    MoreDataNewOffset,
}

/// Decoded response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstHeader {
    /// Bytes returned in the whole response.
    pub total_bytes: u32,
    /// Offset of the first entry header from the start of the response.
    pub offset_to_first_entry: u32,
    /// Number of entries returned.
    pub entry_count: u32,
    /// Response status.
    pub status: OffsetStatus,
    /// Where the next call must start, for [`OffsetStatus::MoreDataNewOffset`].
    pub continuation: Option<JournalProcessedPosition>,
}

impl FirstHeader {
    /// Fixed length in bytes.
    pub const LENGTH: usize = 64;

    /// Decodes the header at `base`.
    pub fn decode(buffer: &[u8], base: usize, ccsid: Ccsid) -> Result<Self, DecodeError> {
        let reader = FieldReader::new(&FIRST_HEADER, buffer, base, ccsid)?;
        let entry_count = reader.u32(&fields::ENTRY_COUNT);

        let continuation = if reader.char(&fields::CONTINUATION_INDICATOR) == MORE_DATA {
            let offset = reader.zoned(&fields::CONTINUATION_SEQUENCE).ok_or_else(|| {
                DecodeError::InvalidField {
                    structure: FIRST_HEADER.name,
                    field: fields::CONTINUATION_SEQUENCE.name,
                    offset: base,
                    value: reader.raw_text(&fields::CONTINUATION_SEQUENCE),
                }
            })?;
            let receiver = JournalReceiver::new(
                reader.text(&fields::CONTINUATION_RECEIVER),
                reader.text(&fields::CONTINUATION_LIBRARY),
            );
            Some(JournalProcessedPosition::unprocessed(JournalPosition::new(
                receiver, offset,
            )))
        } else {
            None
        };

        let status = match (&continuation, entry_count) {
            (Some(_), _) => OffsetStatus::MoreDataNewOffset,
            (None, 0) => OffsetStatus::NoData,
            (None, _) => OffsetStatus::Data,
        };

        Ok(Self {
            total_bytes: reader.u32(&fields::BYTES_RETURNED),
            offset_to_first_entry: reader.u32(&fields::OFFSET_TO_FIRST_ENTRY),
            entry_count,
            status,
            continuation,
        })
    }

    /// Encodes the header. The status is implied by `continuation` and
    /// `entry_count`.
    pub fn encode(&self, ccsid: Ccsid) -> Result<Vec<u8>, DecodeError> {
        let mut writer = FieldWriter::new(&FIRST_HEADER, ccsid);
        writer
            .unsigned(&fields::BYTES_RETURNED, u64::from(self.total_bytes))?
            .unsigned(&fields::OFFSET_TO_FIRST_ENTRY, u64::from(self.offset_to_first_entry))?
            .unsigned(&fields::ENTRY_COUNT, u64::from(self.entry_count))?;
        match &self.continuation {
            Some(position) => {
                writer
                    .text(&fields::CONTINUATION_INDICATOR, "1")
                    .text(&fields::CONTINUATION_RECEIVER, position.receiver().name.as_ref())
                    .text(&fields::CONTINUATION_LIBRARY, position.receiver().library.as_ref())
                    .zoned(&fields::CONTINUATION_SEQUENCE, position.offset())?;
            }
            None => {
                writer
                    .text(&fields::CONTINUATION_INDICATOR, "0")
                    .text(&fields::CONTINUATION_RECEIVER, "")
                    .text(&fields::CONTINUATION_LIBRARY, "")
                    .text(&fields::CONTINUATION_SEQUENCE, "");
            }
        }
        Ok(writer.finish())
    }

    /// Whether the host has more entries after this response.
    pub fn has_more(&self) -> bool {
        self.status == OffsetStatus::MoreDataNewOffset
    }
}
