//! Journal entry header and the variable-length areas it points to.

use crate::errors::DecodeError;
use crate::layout::{Field, FieldKind, FieldReader, FieldWriter, Layout};
use crate::receiver::ReceiverName;
use crate::text::Ccsid;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Field table of the entry header.
pub mod fields {
    use super::*;

    /// Displacement from this entry to the next one; 0 on the last entry.
    pub const NEXT_ENTRY: Field = Field::new("next_entry_offset", 0, 4, FieldKind::Unsigned);
    /// Displacement to the null value indicators.
    pub const NULL_INDICATORS: Field =
        Field::new("null_indicator_offset", 4, 4, FieldKind::Unsigned);
    /// Displacement to the entry-specific data.
    pub const ENTRY_SPECIFIC_DATA: Field =
        Field::new("entry_specific_data_offset", 8, 4, FieldKind::Unsigned);
    /// Displacement to the transaction identifier.
    pub const TRANSACTION_ID: Field = Field::new("transaction_id_offset", 12, 4, FieldKind::Unsigned);
    /// Displacement to the logical unit of work.
    pub const LOGICAL_UNIT_OF_WORK: Field =
        Field::new("logical_unit_of_work_offset", 16, 4, FieldKind::Unsigned);
    /// Displacement to the receiver-name sub-record.
    pub const RECEIVER_INFO: Field = Field::new("receiver_info_offset", 20, 4, FieldKind::Unsigned);
    /// Journal sequence number.
    pub const SEQUENCE_NUMBER: Field = Field::new("sequence_number", 24, 8, FieldKind::Unsigned);
    /// `*DTS` time the entry was written.
    pub const TIMESTAMP: Field = Field::new("timestamp", 32, 8, FieldKind::Dts);
    /// Thread that wrote the entry.
    pub const THREAD_ID: Field = Field::new("thread_id", 40, 8, FieldKind::Unsigned);
    /// System-wide sequence number.
    pub const SYSTEM_SEQUENCE: Field = Field::new("system_sequence_number", 48, 8, FieldKind::Unsigned);
    /// Count or relative record number.
    pub const COUNT_OR_RRN: Field = Field::new("count_or_rrn", 56, 8, FieldKind::Unsigned);
    /// Commit cycle identifier.
    pub const COMMIT_CYCLE: Field = Field::new("commit_cycle_id", 64, 8, FieldKind::Unsigned);
    /// Pointer handle.
    pub const POINTER_HANDLE: Field = Field::new("pointer_handle", 72, 4, FieldKind::Unsigned);
    /// Remote port.
    pub const REMOTE_PORT: Field = Field::new("remote_port", 76, 2, FieldKind::Unsigned);
    /// Arm number.
    pub const ARM_NUMBER: Field = Field::new("arm_number", 78, 2, FieldKind::Unsigned);
    /// Program library ASP number.
    pub const PROGRAM_LIBRARY_ASP: Field =
        Field::new("program_library_asp", 80, 2, FieldKind::Unsigned);
    /// Remote address.
    pub const REMOTE_ADDRESS: Field = Field::new("remote_address", 82, 16, FieldKind::Text);
    /// Journal code.
    pub const JOURNAL_CODE: Field = Field::new("journal_code", 98, 1, FieldKind::Text);
    /// Entry type.
    pub const ENTRY_TYPE: Field = Field::new("entry_type", 99, 2, FieldKind::Text);
    /// Job name.
    pub const JOB_NAME: Field = Field::new("job_name", 101, 10, FieldKind::Text);
    /// Job user name.
    pub const USER_NAME: Field = Field::new("user_name", 111, 10, FieldKind::Text);
    /// Job number.
    pub const JOB_NUMBER: Field = Field::new("job_number", 121, 6, FieldKind::Text);
    /// Program name.
    pub const PROGRAM_NAME: Field = Field::new("program_name", 127, 10, FieldKind::Text);
    /// Program library.
    pub const PROGRAM_LIBRARY: Field = Field::new("program_library", 137, 10, FieldKind::Text);
    /// Program library ASP device.
    pub const PROGRAM_ASP_DEVICE: Field =
        Field::new("program_asp_device", 147, 10, FieldKind::Text);
    /// Object: file, library and member, 10 characters each.
    pub const OBJECT: Field = Field::new("object", 157, 30, FieldKind::Text);
    /// User profile.
    pub const USER_PROFILE: Field = Field::new("user_profile", 187, 10, FieldKind::Text);
    /// Journal identifier.
    pub const JOURNAL_ID: Field = Field::new("journal_identifier", 197, 10, FieldKind::Bytes);
    /// Address family.
    pub const ADDRESS_FAMILY: Field = Field::new("address_family", 207, 1, FieldKind::Text);
    /// System name.
    pub const SYSTEM_NAME: Field = Field::new("system_name", 208, 8, FieldKind::Text);
    /// Indicator flag.
    pub const INDICATOR_FLAG: Field = Field::new("indicator_flag", 216, 1, FieldKind::Text);
    /// Object name indicator.
    pub const OBJECT_NAME_INDICATOR: Field =
        Field::new("object_name_indicator", 217, 1, FieldKind::Text);
    /// Bit fields.
    pub const BIT_FIELDS: Field = Field::new("bit_fields", 218, 1, FieldKind::Bytes);
    /// Reserved.
    pub const RESERVED: Field = Field::new("reserved", 219, 10, FieldKind::Bytes);
}

/// Layout of the entry header.
pub const ENTRY_HEADER: Layout = Layout {
    name: "entry header",
    length: 229,
    fields: &[
        fields::NEXT_ENTRY,
        fields::NULL_INDICATORS,
        fields::ENTRY_SPECIFIC_DATA,
        fields::TRANSACTION_ID,
        fields::LOGICAL_UNIT_OF_WORK,
        fields::RECEIVER_INFO,
        fields::SEQUENCE_NUMBER,
        fields::TIMESTAMP,
        fields::THREAD_ID,
        fields::SYSTEM_SEQUENCE,
        fields::COUNT_OR_RRN,
        fields::COMMIT_CYCLE,
        fields::POINTER_HANDLE,
        fields::REMOTE_PORT,
        fields::ARM_NUMBER,
        fields::PROGRAM_LIBRARY_ASP,
        fields::REMOTE_ADDRESS,
        fields::JOURNAL_CODE,
        fields::ENTRY_TYPE,
        fields::JOB_NAME,
        fields::USER_NAME,
        fields::JOB_NUMBER,
        fields::PROGRAM_NAME,
        fields::PROGRAM_LIBRARY,
        fields::PROGRAM_ASP_DEVICE,
        fields::OBJECT,
        fields::USER_PROFILE,
        fields::JOURNAL_ID,
        fields::ADDRESS_FAMILY,
        fields::SYSTEM_NAME,
        fields::INDICATOR_FLAG,
        fields::OBJECT_NAME_INDICATOR,
        fields::BIT_FIELDS,
        fields::RESERVED,
    ],
};

/// Width of each part of the object field, in characters.
const OBJECT_PART_WIDTH: usize = 10;

/// Width of the entry-specific data length prefix.
const ESD_LENGTH_WIDTH: usize = 5;

/// Offset of the data inside the entry-specific data area.
const ESD_DATA_OFFSET: usize = 16;

/// Width of the null indicator length prefix.
const NULL_LENGTH_WIDTH: usize = 4;

/// Largest displacement the host can express.
const MAX_DISPLACEMENT: u64 = i32::MAX as u64;

/// File, library and member named by an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct JournalObject {
    /// File name.
    pub file: String,
    /// Library name.
    pub library: String,
    /// Member name; empty when the entry names no member.
    pub member: String,
}

impl JournalObject {
    /// Splits the 30-character object field into its three parts.
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let part = |index: usize| -> String {
            chars
                .iter()
                .skip(index * OBJECT_PART_WIDTH)
                .take(OBJECT_PART_WIDTH)
                .collect::<String>()
                .trim()
                .to_string()
        };
        Self {
            file: part(0),
            library: part(1),
            member: part(2),
        }
    }

    /// The object field text, each part padded to ten characters.
    pub fn to_text(&self) -> String {
        format!(
            "{:<w$}{:<w$}{:<w$}",
            self.file,
            self.library,
            self.member,
            w = OBJECT_PART_WIDTH
        )
    }

    /// `LIBRARY.FILE`, the schema-qualified table name.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.library, self.file)
    }

    /// Whether the entry names no object.
    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.library.is_empty()
    }
}

/// Computes where an entry ends, relative to its own start.
///
/// A zero displacement marks the last entry, which runs to the end of the
/// buffer.
pub fn entry_end_offset(next_entry_offset: u32, buffer_len: usize, base: usize) -> usize {
    if next_entry_offset == 0 {
        buffer_len.saturating_sub(base)
    } else {
        next_entry_offset as usize
    }
}

/// Decoded entry header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryHeader {
    /// Displacement to the next entry; 0 on the last entry.
    pub next_entry_offset: u32,
    /// Displacement to the null value indicators; 0 when absent.
    pub null_indicator_offset: u32,
    /// Displacement to the entry-specific data; 0 when absent.
    pub entry_specific_data_offset: u32,
    /// Displacement to the transaction identifier.
    pub transaction_id_offset: u32,
    /// Displacement to the logical unit of work.
    pub logical_unit_of_work_offset: u32,
    /// Displacement to the receiver-name sub-record; 0 when absent.
    pub receiver_info_offset: u32,
    /// Journal sequence number.
    pub sequence_number: u64,
    /// Time the entry was written.
    pub timestamp: Option<DateTime<Utc>>,
    /// Thread that wrote the entry.
    pub thread_id: u64,
    /// System-wide sequence number.
    pub system_sequence_number: u64,
    /// Count or relative record number.
    pub count_or_rrn: u64,
    /// Commit cycle identifier; 0 outside commitment control.
    pub commit_cycle_id: u64,
    /// Pointer handle.
    pub pointer_handle: u32,
    /// Remote port.
    pub remote_port: u16,
    /// Arm number.
    pub arm_number: u16,
    /// Program library ASP number.
    pub program_library_asp: u16,
    /// Remote address.
    pub remote_address: String,
    /// Journal code, e.g. `R`.
    pub journal_code: String,
    /// Entry type, e.g. `PT`.
    pub entry_type: String,
    /// Job name.
    pub job_name: String,
    /// Job user name.
    pub user_name: String,
    /// Job number.
    pub job_number: String,
    /// Program name.
    pub program_name: String,
    /// Program library.
    pub program_library: String,
    /// Program library ASP device.
    pub program_asp_device: String,
    /// Object the entry refers to.
    pub object: JournalObject,
    /// User profile.
    pub user_profile: String,
    /// Journal identifier, hex encoded.
    pub journal_identifier: String,
    /// Address family.
    pub address_family: String,
    /// System name.
    pub system_name: String,
    /// Indicator flag.
    pub indicator_flag: String,
    /// Object name indicator.
    pub object_name_indicator: String,
    /// Bit fields.
    pub bit_fields: u8,
    /// Receiver that holds the entry, when the header points at one.
    pub receiver: Option<ReceiverName>,
    /// Length of the entry from its start, see [`entry_end_offset`].
    pub end_offset: usize,
}

fn displacement(reader: &FieldReader<'_>, field: &Field) -> Result<u32, DecodeError> {
    let value = reader.unsigned(field);
    if value > MAX_DISPLACEMENT {
        return Err(DecodeError::OffsetOutOfRange {
            field: field.name,
            offset: reader.base(),
            value,
        });
    }
    u32::try_from(value).map_err(|_| DecodeError::OffsetOutOfRange {
        field: field.name,
        offset: reader.base(),
        value,
    })
}

impl EntryHeader {
    /// Fixed length in bytes.
    pub const LENGTH: usize = 229;

    /// Decodes the entry header at `base`.
    ///
    /// Displacements above `i32::MAX` are rejected rather than truncated. The
    /// receiver-name sub-record is read only when its displacement is set.
    pub fn decode(buffer: &[u8], base: usize, ccsid: Ccsid) -> Result<Self, DecodeError> {
        use fields as f;

        let reader = FieldReader::new(&ENTRY_HEADER, buffer, base, ccsid)?;
        let next_entry_offset = displacement(&reader, &f::NEXT_ENTRY)?;
        let null_indicator_offset = displacement(&reader, &f::NULL_INDICATORS)?;
        let entry_specific_data_offset = displacement(&reader, &f::ENTRY_SPECIFIC_DATA)?;
        let receiver_info_offset = displacement(&reader, &f::RECEIVER_INFO)?;

        let receiver = if receiver_info_offset > 0 {
            Some(ReceiverName::decode(
                buffer,
                base + receiver_info_offset as usize,
                ccsid,
            )?)
        } else {
            None
        };

        let small = |field: &Field| u16::try_from(reader.unsigned(field)).unwrap_or(u16::MAX);

        Ok(Self {
            next_entry_offset,
            null_indicator_offset,
            entry_specific_data_offset,
            transaction_id_offset: reader.u32(&f::TRANSACTION_ID),
            logical_unit_of_work_offset: reader.u32(&f::LOGICAL_UNIT_OF_WORK),
            receiver_info_offset,
            sequence_number: reader.unsigned(&f::SEQUENCE_NUMBER),
            timestamp: reader.dts(&f::TIMESTAMP),
            thread_id: reader.unsigned(&f::THREAD_ID),
            system_sequence_number: reader.unsigned(&f::SYSTEM_SEQUENCE),
            count_or_rrn: reader.unsigned(&f::COUNT_OR_RRN),
            commit_cycle_id: reader.unsigned(&f::COMMIT_CYCLE),
            pointer_handle: reader.u32(&f::POINTER_HANDLE),
            remote_port: small(&f::REMOTE_PORT),
            arm_number: small(&f::ARM_NUMBER),
            program_library_asp: small(&f::PROGRAM_LIBRARY_ASP),
            remote_address: reader.text(&f::REMOTE_ADDRESS),
            journal_code: reader.text(&f::JOURNAL_CODE),
            entry_type: reader.text(&f::ENTRY_TYPE),
            job_name: reader.text(&f::JOB_NAME),
            user_name: reader.text(&f::USER_NAME),
            job_number: reader.text(&f::JOB_NUMBER),
            program_name: reader.text(&f::PROGRAM_NAME),
            program_library: reader.text(&f::PROGRAM_LIBRARY),
            program_asp_device: reader.text(&f::PROGRAM_ASP_DEVICE),
            object: JournalObject::from_text(&reader.raw_text(&f::OBJECT)),
            user_profile: reader.text(&f::USER_PROFILE),
            journal_identifier: hex::encode(reader.bytes(&f::JOURNAL_ID)),
            address_family: reader.text(&f::ADDRESS_FAMILY),
            system_name: reader.text(&f::SYSTEM_NAME),
            indicator_flag: reader.text(&f::INDICATOR_FLAG),
            object_name_indicator: reader.text(&f::OBJECT_NAME_INDICATOR),
            bit_fields: reader.bytes(&f::BIT_FIELDS).first().copied().unwrap_or(0),
            receiver,
            end_offset: entry_end_offset(next_entry_offset, buffer.len(), base),
        })
    }

    /// Encodes the fixed header. The receiver sub-record and variable areas
    /// are laid out by the caller at the displacements set here.
    pub fn encode(&self, ccsid: Ccsid) -> Result<Vec<u8>, DecodeError> {
        use fields as f;

        let journal_identifier = hex::decode(&self.journal_identifier).unwrap_or_default();
        let mut writer = FieldWriter::new(&ENTRY_HEADER, ccsid);
        writer
            .unsigned(&f::NEXT_ENTRY, u64::from(self.next_entry_offset))?
            .unsigned(&f::NULL_INDICATORS, u64::from(self.null_indicator_offset))?
            .unsigned(&f::ENTRY_SPECIFIC_DATA, u64::from(self.entry_specific_data_offset))?
            .unsigned(&f::TRANSACTION_ID, u64::from(self.transaction_id_offset))?
            .unsigned(&f::LOGICAL_UNIT_OF_WORK, u64::from(self.logical_unit_of_work_offset))?
            .unsigned(&f::RECEIVER_INFO, u64::from(self.receiver_info_offset))?
            .unsigned(&f::SEQUENCE_NUMBER, self.sequence_number)?
            .dts(&f::TIMESTAMP, self.timestamp.as_ref())?
            .unsigned(&f::THREAD_ID, self.thread_id)?
            .unsigned(&f::SYSTEM_SEQUENCE, self.system_sequence_number)?
            .unsigned(&f::COUNT_OR_RRN, self.count_or_rrn)?
            .unsigned(&f::COMMIT_CYCLE, self.commit_cycle_id)?
            .unsigned(&f::POINTER_HANDLE, u64::from(self.pointer_handle))?
            .unsigned(&f::REMOTE_PORT, u64::from(self.remote_port))?
            .unsigned(&f::ARM_NUMBER, u64::from(self.arm_number))?
            .unsigned(&f::PROGRAM_LIBRARY_ASP, u64::from(self.program_library_asp))?
            .text(&f::REMOTE_ADDRESS, &self.remote_address)
            .text(&f::JOURNAL_CODE, &self.journal_code)
            .text(&f::ENTRY_TYPE, &self.entry_type)
            .text(&f::JOB_NAME, &self.job_name)
            .text(&f::USER_NAME, &self.user_name)
            .text(&f::JOB_NUMBER, &self.job_number)
            .text(&f::PROGRAM_NAME, &self.program_name)
            .text(&f::PROGRAM_LIBRARY, &self.program_library)
            .text(&f::PROGRAM_ASP_DEVICE, &self.program_asp_device)
            .text(&f::OBJECT, &self.object.to_text())
            .text(&f::USER_PROFILE, &self.user_profile)
            .bytes(&f::JOURNAL_ID, &journal_identifier)
            .text(&f::ADDRESS_FAMILY, &self.address_family)
            .text(&f::SYSTEM_NAME, &self.system_name)
            .text(&f::INDICATOR_FLAG, &self.indicator_flag)
            .text(&f::OBJECT_NAME_INDICATOR, &self.object_name_indicator)
            .bytes(&f::BIT_FIELDS, &[self.bit_fields]);
        Ok(writer.finish())
    }

    /// Row image carried in the entry-specific data area.
    ///
    /// `entry` is the entry's bytes from its start. The area is clamped to
    /// the entry; a length prefix that is not numeric yields everything up to
    /// the end of the entry.
    pub fn entry_specific_data<'a>(&self, entry: &'a [u8], ccsid: Ccsid) -> &'a [u8] {
        if self.entry_specific_data_offset == 0 {
            return &[];
        }
        let entry = clamp(entry, self.end_offset);
        let area = self.entry_specific_data_offset as usize;
        let start = area.saturating_add(ESD_DATA_OFFSET);
        if start > entry.len() {
            return &[];
        }
        let length = entry
            .get(area..area + ESD_LENGTH_WIDTH)
            .map(|raw| ccsid.decode(raw))
            .and_then(|text| text.trim().parse::<usize>().ok());
        let end = match length {
            Some(length) => start.saturating_add(length).min(entry.len()),
            None => entry.len(),
        };
        &entry[start..end]
    }

    /// Null value indicators, one byte per column. Clamped to the entry.
    pub fn null_indicators<'a>(&self, entry: &'a [u8]) -> &'a [u8] {
        if self.null_indicator_offset == 0 {
            return &[];
        }
        let entry = clamp(entry, self.end_offset);
        let area = self.null_indicator_offset as usize;
        let start = area.saturating_add(NULL_LENGTH_WIDTH);
        let Some(prefix) = entry.get(area..start) else {
            return &[];
        };
        let length = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let end = start.saturating_add(length).min(entry.len());
        &entry[start..end]
    }
}

fn clamp(entry: &[u8], end_offset: usize) -> &[u8] {
    &entry[..end_offset.min(entry.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(next: u32) -> EntryHeader {
        EntryHeader {
            next_entry_offset: next,
            sequence_number: 42,
            journal_code: "R".to_string(),
            entry_type: "PT".to_string(),
            job_name: "QZDASOINIT".to_string(),
            object: JournalObject::from_text("ORDERS    APPDATA   ORDERS    "),
            ..Default::default()
        }
    }

    #[test]
    fn last_entry_runs_to_end_of_buffer() {
        assert_eq!(entry_end_offset(0, 100, 20), 80);
        assert_eq!(entry_end_offset(300, 100, 20), 300);
    }

    #[test]
    fn last_entry_header_at_non_zero_base() {
        let mut buffer = vec![0u8; 20];
        buffer.extend(header(0).encode(Ccsid::Ebcdic37).unwrap());
        buffer.extend(vec![0u8; 31]);

        let decoded = EntryHeader::decode(&buffer, 20, Ccsid::Ebcdic37).unwrap();
        assert_eq!(decoded.end_offset, EntryHeader::LENGTH + 31);
        assert_eq!(decoded.sequence_number, 42);
        assert_eq!(decoded.journal_code, "R");
        assert_eq!(decoded.entry_type, "PT");
        assert_eq!(decoded.job_name, "QZDASOINIT");
        assert!(decoded.receiver.is_none());
    }

    #[test]
    fn object_name_splits_into_file_library_member() {
        let object = JournalObject::from_text("TESTT     LIBRARY1                    ");
        assert_eq!(object.file, "TESTT");
        assert_eq!(object.library, "LIBRARY1");
        assert_eq!(object.member, "");
        assert_eq!(object.qualified_table(), "LIBRARY1.TESTT");
    }

    #[test]
    fn displacement_above_i32_max_is_rejected() {
        let mut bytes = header(0).encode(Ccsid::Ebcdic37).unwrap();
        bytes[0..4].copy_from_slice(&0x8000_0000u32.to_be_bytes());
        let err = EntryHeader::decode(&bytes, 0, Ccsid::Ebcdic37).unwrap_err();
        assert_eq!(
            err,
            DecodeError::OffsetOutOfRange {
                field: "next_entry_offset",
                offset: 0,
                value: 0x8000_0000,
            }
        );

        let mut bytes = header(0).encode(Ccsid::Ebcdic37).unwrap();
        bytes[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            EntryHeader::decode(&bytes, 0, Ccsid::Ebcdic37),
            Err(DecodeError::OffsetOutOfRange { field: "null_indicator_offset", .. })
        ));
    }

    #[test]
    fn short_buffer_fails() {
        let bytes = header(0).encode(Ccsid::Ebcdic37).unwrap();
        for len in [0, 1, 100, EntryHeader::LENGTH - 1] {
            assert!(matches!(
                EntryHeader::decode(&bytes[..len], 0, Ccsid::Ebcdic37),
                Err(DecodeError::BufferTooShort { .. })
            ));
        }
    }

    #[test]
    fn entry_specific_data_is_clamped() {
        let mut entry = header(0);
        entry.entry_specific_data_offset = EntryHeader::LENGTH as u32;
        entry.end_offset = EntryHeader::LENGTH + 16 + 4;

        let mut bytes = entry.encode(Ccsid::Ebcdic37).unwrap();
        let mut prefix = Ccsid::Ebcdic37.encode("00010");
        prefix.resize(16, 0);
        bytes.extend(prefix);
        bytes.extend([1, 2, 3, 4]);

        assert_eq!(entry.entry_specific_data(&bytes, Ccsid::Ebcdic37), &[1, 2, 3, 4]);
    }

    #[test]
    fn unreadable_length_takes_rest_of_entry() {
        let mut entry = header(0);
        entry.entry_specific_data_offset = EntryHeader::LENGTH as u32;
        entry.end_offset = EntryHeader::LENGTH + 19;

        let mut bytes = entry.encode(Ccsid::Ebcdic37).unwrap();
        bytes.extend(vec![0u8; 16]);
        bytes.extend([7, 8, 9]);

        assert_eq!(entry.entry_specific_data(&bytes, Ccsid::Ebcdic37), &[7, 8, 9]);
    }

    #[test]
    fn null_indicators_follow_their_length() {
        let mut entry = header(0);
        entry.null_indicator_offset = EntryHeader::LENGTH as u32;
        entry.end_offset = EntryHeader::LENGTH + 7;

        let mut bytes = entry.encode(Ccsid::Ebcdic37).unwrap();
        bytes.extend(3u32.to_be_bytes());
        bytes.extend([0xF0, 0xF1, 0xF0, 0xFF]);

        assert_eq!(entry.null_indicators(&bytes), &[0xF0, 0xF1, 0xF0]);
    }
}
