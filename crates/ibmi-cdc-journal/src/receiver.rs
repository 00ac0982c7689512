//! Receiver records: the name sub-record carried by entries and the receiver
//! detail record returned by the receiver listing.

use crate::errors::DecodeError;
use crate::layout::{Field, FieldKind, FieldReader, FieldWriter, Layout};
use crate::text::Ccsid;
use chrono::NaiveDateTime;
use ibmi_cdc_model::{
    parse_chain_position, BigUint, DetailedJournalReceiver, JournalId, JournalReceiver,
    JournalReceiverInfo, JournalStatus,
};
use serde::Serialize;

/// Field table of the receiver-name sub-record.
pub mod name_fields {
    use super::*;

    /// Receiver name.
    pub const RECEIVER: Field = Field::new("receiver", 0, 10, FieldKind::Text);
    /// Receiver library.
    pub const LIBRARY: Field = Field::new("library", 10, 10, FieldKind::Text);
    /// ASP device holding the library.
    pub const ASP_DEVICE: Field = Field::new("asp_device", 20, 10, FieldKind::Text);
    /// ASP number.
    pub const ASP_NUMBER: Field = Field::new("asp_number", 30, 4, FieldKind::Signed);
}

/// Layout of the receiver-name sub-record.
pub const RECEIVER_NAME: Layout = Layout {
    name: "receiver name",
    length: 34,
    fields: &[
        name_fields::RECEIVER,
        name_fields::LIBRARY,
        name_fields::ASP_DEVICE,
        name_fields::ASP_NUMBER,
    ],
};

/// Receiver that wrote an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverName {
    /// Receiver identity.
    pub receiver: JournalReceiver,
    /// ASP device, blank for the system ASP.
    pub asp_device: String,
    /// ASP number.
    pub asp_number: i32,
}

impl ReceiverName {
    /// Decodes the sub-record at `base`.
    pub fn decode(buffer: &[u8], base: usize, ccsid: Ccsid) -> Result<Self, DecodeError> {
        let reader = FieldReader::new(&RECEIVER_NAME, buffer, base, ccsid)?;
        Ok(Self {
            receiver: JournalReceiver::new(
                reader.text(&name_fields::RECEIVER),
                reader.text(&name_fields::LIBRARY),
            ),
            asp_device: reader.text(&name_fields::ASP_DEVICE),
            asp_number: i32::try_from(reader.signed(&name_fields::ASP_NUMBER)).unwrap_or_default(),
        })
    }

    /// Encodes the sub-record.
    pub fn encode(&self, ccsid: Ccsid) -> Result<Vec<u8>, DecodeError> {
        let mut writer = FieldWriter::new(&RECEIVER_NAME, ccsid);
        writer
            .text(&name_fields::RECEIVER, self.receiver.name.as_ref())
            .text(&name_fields::LIBRARY, self.receiver.library.as_ref())
            .text(&name_fields::ASP_DEVICE, &self.asp_device)
            .signed(&name_fields::ASP_NUMBER, i64::from(self.asp_number))?;
        Ok(writer.finish())
    }
}

/// Field table of the receiver detail record.
pub mod detail_fields {
    use super::*;

    /// Bytes returned.
    pub const BYTES_RETURNED: Field = Field::new("bytes_returned", 0, 4, FieldKind::Unsigned);
    /// Bytes available.
    pub const BYTES_AVAILABLE: Field = Field::new("bytes_available", 4, 4, FieldKind::Unsigned);
    /// Receiver name.
    pub const RECEIVER: Field = Field::new("receiver", 8, 10, FieldKind::Text);
    /// Receiver library.
    pub const RECEIVER_LIBRARY: Field = Field::new("receiver_library", 18, 10, FieldKind::Text);
    /// Journal name.
    pub const JOURNAL: Field = Field::new("journal", 28, 10, FieldKind::Text);
    /// Journal library.
    pub const JOURNAL_LIBRARY: Field = Field::new("journal_library", 38, 10, FieldKind::Text);
    /// Size threshold.
    pub const THRESHOLD: Field = Field::new("threshold", 48, 4, FieldKind::Unsigned);
    /// Receiver size.
    pub const SIZE: Field = Field::new("size", 52, 4, FieldKind::Unsigned);
    /// ASP number.
    pub const ASP_NUMBER: Field = Field::new("asp_number", 56, 4, FieldKind::Unsigned);
    /// Percent of threshold used.
    pub const PERCENT_USED: Field = Field::new("percent_used", 60, 4, FieldKind::Unsigned);
    /// Longest entry held.
    pub const MAX_ENTRY_LENGTH: Field = Field::new("max_entry_length", 64, 4, FieldKind::Unsigned);
    /// Status character.
    pub const STATUS: Field = Field::new("status", 68, 1, FieldKind::Text);
    /// Attach time.
    pub const ATTACHED: Field = Field::new("attached", 69, 13, FieldKind::HostTimestamp);
    /// Detach time.
    pub const DETACHED: Field = Field::new("detached", 82, 13, FieldKind::HostTimestamp);
    /// Save time.
    pub const SAVED: Field = Field::new("saved", 95, 13, FieldKind::HostTimestamp);
    /// Text description.
    pub const DESCRIPTION: Field = Field::new("description", 108, 50, FieldKind::Text);
    /// Pending transactions flag.
    pub const PENDING_TRANSACTIONS: Field =
        Field::new("pending_transactions", 158, 1, FieldKind::Text);
    /// Receiver number, the position in the chain.
    pub const RECEIVER_NUMBER: Field = Field::new("receiver_number", 159, 5, FieldKind::Text);
    /// Previous receiver.
    pub const PREVIOUS_RECEIVER: Field = Field::new("previous_receiver", 164, 10, FieldKind::Text);
    /// Previous receiver library.
    pub const PREVIOUS_LIBRARY: Field = Field::new("previous_library", 174, 10, FieldKind::Text);
    /// Next receiver.
    pub const NEXT_RECEIVER: Field = Field::new("next_receiver", 184, 10, FieldKind::Text);
    /// Next receiver library.
    pub const NEXT_LIBRARY: Field = Field::new("next_library", 194, 10, FieldKind::Text);
    /// Number of entries.
    pub const ENTRY_COUNT: Field = Field::new("entry_count", 204, 20, FieldKind::Zoned);
    /// First sequence number.
    pub const FIRST_SEQUENCE: Field = Field::new("first_sequence", 224, 20, FieldKind::Zoned);
    /// Last sequence number.
    pub const LAST_SEQUENCE: Field = Field::new("last_sequence", 244, 20, FieldKind::Zoned);
}

/// Layout of the receiver detail record.
pub const RECEIVER_DETAIL: Layout = Layout {
    name: "receiver detail",
    length: 264,
    fields: &[
        detail_fields::BYTES_RETURNED,
        detail_fields::BYTES_AVAILABLE,
        detail_fields::RECEIVER,
        detail_fields::RECEIVER_LIBRARY,
        detail_fields::JOURNAL,
        detail_fields::JOURNAL_LIBRARY,
        detail_fields::THRESHOLD,
        detail_fields::SIZE,
        detail_fields::ASP_NUMBER,
        detail_fields::PERCENT_USED,
        detail_fields::MAX_ENTRY_LENGTH,
        detail_fields::STATUS,
        detail_fields::ATTACHED,
        detail_fields::DETACHED,
        detail_fields::SAVED,
        detail_fields::DESCRIPTION,
        detail_fields::PENDING_TRANSACTIONS,
        detail_fields::RECEIVER_NUMBER,
        detail_fields::PREVIOUS_RECEIVER,
        detail_fields::PREVIOUS_LIBRARY,
        detail_fields::NEXT_RECEIVER,
        detail_fields::NEXT_LIBRARY,
        detail_fields::ENTRY_COUNT,
        detail_fields::FIRST_SEQUENCE,
        detail_fields::LAST_SEQUENCE,
    ],
};

/// A decoded receiver detail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiverDetail {
    /// Chain-relevant metadata.
    pub receiver: DetailedJournalReceiver,
    /// Journal the receiver belongs to.
    pub journal: JournalId,
    /// Predecessor, if any.
    pub previous_receiver: Option<JournalReceiver>,
    /// Detach time, absent while attached.
    pub detach_time: Option<NaiveDateTime>,
    /// Save time, absent if never saved.
    pub save_time: Option<NaiveDateTime>,
    /// Text description.
    pub description: String,
    /// Receiver size as reported by the host.
    pub size: u32,
}

fn optional_receiver(name: String, library: String) -> Option<JournalReceiver> {
    if name.is_empty() {
        None
    } else {
        Some(JournalReceiver::new(name, library))
    }
}

impl ReceiverDetail {
    /// Decodes the record at `base`.
    ///
    /// An unknown status character is an error. Malformed timestamps and a
    /// malformed receiver number only leave their field absent.
    pub fn decode(buffer: &[u8], base: usize, ccsid: Ccsid) -> Result<Self, DecodeError> {
        use detail_fields as f;

        let reader = FieldReader::new(&RECEIVER_DETAIL, buffer, base, ccsid)?;
        let invalid = |field: &Field| DecodeError::InvalidField {
            structure: RECEIVER_DETAIL.name,
            field: field.name,
            offset: base,
            value: reader.raw_text(field),
        };

        let status = JournalStatus::from_code(reader.char(&f::STATUS)).ok_or_else(|| invalid(&f::STATUS))?;

        // A receiver that was never attached carries no sequence range.
        let sequence = |field: &Field| match reader.zoned(field) {
            Some(value) => Ok(value),
            None if status == JournalStatus::Empty => Ok(BigUint::default()),
            None => Err(invalid(field)),
        };
        let start = sequence(&f::FIRST_SEQUENCE)?;
        let end = sequence(&f::LAST_SEQUENCE)?;

        let receiver = DetailedJournalReceiver {
            info: JournalReceiverInfo {
                receiver: JournalReceiver::new(
                    reader.text(&f::RECEIVER),
                    reader.text(&f::RECEIVER_LIBRARY),
                ),
                attach_time: reader.host_timestamp(&f::ATTACHED),
                status,
                chain_position: parse_chain_position(&reader.raw_text(&f::RECEIVER_NUMBER)),
            },
            start,
            end,
            next_receiver: optional_receiver(
                reader.text(&f::NEXT_RECEIVER),
                reader.text(&f::NEXT_LIBRARY),
            ),
            max_entry_length: reader.u32(&f::MAX_ENTRY_LENGTH),
            entry_count: reader.zoned(&f::ENTRY_COUNT).unwrap_or_default(),
        };

        Ok(Self {
            receiver,
            journal: JournalId::new(reader.text(&f::JOURNAL), reader.text(&f::JOURNAL_LIBRARY)),
            previous_receiver: optional_receiver(
                reader.text(&f::PREVIOUS_RECEIVER),
                reader.text(&f::PREVIOUS_LIBRARY),
            ),
            detach_time: reader.host_timestamp(&f::DETACHED),
            save_time: reader.host_timestamp(&f::SAVED),
            description: reader.text(&f::DESCRIPTION),
            size: reader.u32(&f::SIZE),
        })
    }

    /// Encodes the record.
    pub fn encode(&self, ccsid: Ccsid) -> Result<Vec<u8>, DecodeError> {
        use detail_fields as f;

        let detailed = &self.receiver;
        let info = &detailed.info;
        let length = RECEIVER_DETAIL.length as u64;
        let chain_position = info
            .chain_position
            .map(|position| format!("{:05}", position))
            .unwrap_or_default();
        let (next_name, next_library) = match &detailed.next_receiver {
            Some(next) => (next.name.as_ref(), next.library.as_ref()),
            None => ("", ""),
        };
        let (previous_name, previous_library) = match &self.previous_receiver {
            Some(previous) => (previous.name.as_ref(), previous.library.as_ref()),
            None => ("", ""),
        };

        let mut writer = FieldWriter::new(&RECEIVER_DETAIL, ccsid);
        writer
            .unsigned(&f::BYTES_RETURNED, length)?
            .unsigned(&f::BYTES_AVAILABLE, length)?
            .text(&f::RECEIVER, info.receiver.name.as_ref())
            .text(&f::RECEIVER_LIBRARY, info.receiver.library.as_ref())
            .text(&f::JOURNAL, self.journal.name.as_ref())
            .text(&f::JOURNAL_LIBRARY, self.journal.library.as_ref())
            .unsigned(&f::SIZE, u64::from(self.size))?
            .unsigned(&f::MAX_ENTRY_LENGTH, u64::from(detailed.max_entry_length))?
            .text(&f::STATUS, &info.status.code().to_string())
            .host_timestamp(&f::ATTACHED, info.attach_time.as_ref())?
            .host_timestamp(&f::DETACHED, self.detach_time.as_ref())?
            .host_timestamp(&f::SAVED, self.save_time.as_ref())?
            .text(&f::DESCRIPTION, &self.description)
            .text(&f::PENDING_TRANSACTIONS, "0")
            .text(&f::RECEIVER_NUMBER, &chain_position)
            .text(&f::PREVIOUS_RECEIVER, previous_name)
            .text(&f::PREVIOUS_LIBRARY, previous_library)
            .text(&f::NEXT_RECEIVER, next_name)
            .text(&f::NEXT_LIBRARY, next_library)
            .zoned(&f::ENTRY_COUNT, &detailed.entry_count)?
            .zoned(&f::FIRST_SEQUENCE, &detailed.start)?
            .zoned(&f::LAST_SEQUENCE, &detailed.end)?;
        Ok(writer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn detail() -> ReceiverDetail {
        ReceiverDetail {
            receiver: DetailedJournalReceiver {
                info: JournalReceiverInfo {
                    receiver: JournalReceiver::new("RCV0002", "JRNLIB"),
                    attach_time: NaiveDate::from_ymd_opt(2024, 3, 1)
                        .unwrap()
                        .and_hms_opt(8, 0, 0),
                    status: JournalStatus::OnlineSavedDetached,
                    chain_position: Some(2),
                },
                start: BigUint::from(101u32),
                end: BigUint::from(250u32),
                next_receiver: Some(JournalReceiver::new("RCV0003", "JRNLIB")),
                max_entry_length: 4096,
                entry_count: BigUint::from(150u32),
            },
            journal: JournalId::new("QSQJRN", "APPDATA"),
            previous_receiver: Some(JournalReceiver::new("RCV0001", "JRNLIB")),
            detach_time: NaiveDate::from_ymd_opt(2024, 3, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0),
            save_time: None,
            description: "nightly".to_string(),
            size: 8192,
        }
    }

    #[test]
    fn detail_record_decodes_every_field() {
        let bytes = detail().encode(Ccsid::Ebcdic37).unwrap();
        assert_eq!(bytes.len(), RECEIVER_DETAIL.length);
        assert_eq!(ReceiverDetail::decode(&bytes, 0, Ccsid::Ebcdic37).unwrap(), detail());
    }

    #[test]
    fn blank_next_receiver_means_no_successor() {
        let mut record = detail();
        record.receiver.next_receiver = None;
        let bytes = record.encode(Ccsid::Ebcdic37).unwrap();
        let decoded = ReceiverDetail::decode(&bytes, 0, Ccsid::Ebcdic37).unwrap();
        assert!(decoded.receiver.next_receiver.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut bytes = detail().encode(Ccsid::Ebcdic37).unwrap();
        bytes[detail_fields::STATUS.offset] = Ccsid::Ebcdic37.encode("9")[0];
        let err = ReceiverDetail::decode(&bytes, 0, Ccsid::Ebcdic37).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "status", .. }));
    }

    #[test]
    fn malformed_attach_time_and_receiver_number_degrade() {
        let mut bytes = detail().encode(Ccsid::Ebcdic37).unwrap();
        let garbage = Ccsid::Ebcdic37.encode_padded("12X", 13);
        bytes[69..82].copy_from_slice(&garbage);
        let short_number = Ccsid::Ebcdic37.encode_padded("12", 5);
        bytes[159..164].copy_from_slice(&short_number);

        let decoded = ReceiverDetail::decode(&bytes, 0, Ccsid::Ebcdic37).unwrap();
        assert!(decoded.receiver.info.attach_time.is_none());
        assert!(decoded.receiver.info.chain_position.is_none());
        assert_eq!(decoded.receiver.end, BigUint::from(250u32));
    }

    #[test]
    fn receiver_name_record_at_offset() {
        let record = ReceiverName {
            receiver: JournalReceiver::new("RCV0001", "JRNLIB"),
            asp_device: String::new(),
            asp_number: -1,
        };
        let mut bytes = vec![0u8; 5];
        bytes.extend(record.encode(Ccsid::Ebcdic37).unwrap());
        assert_eq!(ReceiverName::decode(&bytes, 5, Ccsid::Ebcdic37).unwrap(), record);
        assert!(ReceiverName::decode(&bytes, 6, Ccsid::Ebcdic37).is_err());
    }
}
