use thiserror::Error;

/// Errors raised while decoding or encoding host structures.
///
/// Every variant is structural: the buffer cannot be interpreted as the
/// structure it claims to hold. None of them are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ends before the structure's fixed length.
    #[error("{structure} at offset {offset} needs {needed} bytes, only {available} available")]
    BufferTooShort {
        /// Structure being decoded.
        structure: &'static str,
        /// Base offset of the structure in the buffer.
        offset: usize,
        /// Fixed length of the structure.
        needed: usize,
        /// Bytes left in the buffer from `offset`.
        available: usize,
    },
    /// A displacement does not fit a signed 32-bit host offset.
    #[error("{field} at offset {offset} is out of range: {value}")]
    OffsetOutOfRange {
        /// Displacement field name.
        field: &'static str,
        /// Base offset of the structure holding the field.
        offset: usize,
        /// Raw value.
        value: u64,
    },
    /// Following the entry chain would not move forward or would leave the buffer.
    #[error("invalid entry chain at offset {offset}: {reason}")]
    InvalidEntryChain {
        /// Offset of the entry whose link is bad.
        offset: usize,
        /// Reason for invalidity.
        reason: String,
    },
    /// The header promised more entries than the chain holds.
    #[error("entry count mismatch: header declares {declared}, chain holds {found}")]
    EntryCountMismatch {
        /// Entries declared by the first header.
        declared: u32,
        /// Entries actually linked.
        found: u32,
    },
    /// A field holds a value outside its domain.
    #[error("invalid {field} in {structure} at offset {offset}: {value:?}")]
    InvalidField {
        /// Structure being decoded.
        structure: &'static str,
        /// Field name.
        field: &'static str,
        /// Base offset of the structure.
        offset: usize,
        /// Decoded text of the field.
        value: String,
    },
    /// A value does not fit the host field it is encoded into.
    #[error("{field} value {value} does not fit {width} bytes")]
    FieldOverflow {
        /// Field name.
        field: &'static str,
        /// Value that was rejected.
        value: String,
        /// Field width in bytes.
        width: usize,
    },
}
