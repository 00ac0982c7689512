//! Declarative field tables and the reader/writer that apply them.
//!
//! Each host structure is described once as a [`Layout`]: a fixed byte
//! length plus `(offset, width, kind)` fields. Decoders never index the
//! buffer directly; they create a [`FieldReader`], which checks the fixed
//! length up front, and then pull typed values field by field.

use crate::errors::DecodeError;
use crate::text::Ccsid;
use chrono::{DateTime, NaiveDateTime, Utc};
use ibmi_cdc_model::{format_host_timestamp, from_dts, parse_host_timestamp, parse_offset, to_dts, BigUint};
use std::fmt;

/// How the bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Big-endian unsigned integer of 1, 2, 4 or 8 bytes.
    Unsigned,
    /// Big-endian two's complement integer of 1, 2, 4 or 8 bytes.
    Signed,
    /// Space-padded text in the buffer's CCSID.
    Text,
    /// Zoned decimal digits as text.
    Zoned,
    /// 8-byte `*DTS` system clock value.
    Dts,
    /// 13-character `CYYMMDDHHMMSS` host timestamp.
    HostTimestamp,
    /// Opaque bytes (bit fields, reserved areas).
    Bytes,
}

/// One field of a fixed-length host structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Field name, used in errors and dumps.
    pub name: &'static str,
    /// Offset from the start of the structure.
    pub offset: usize,
    /// Width in bytes.
    pub width: usize,
    /// Interpretation.
    pub kind: FieldKind,
}

impl Field {
    /// Declares a field.
    pub const fn new(name: &'static str, offset: usize, width: usize, kind: FieldKind) -> Self {
        Self {
            name,
            offset,
            width,
            kind,
        }
    }

    /// Offset one past the last byte of the field.
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// A fixed-length host structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Structure name, used in errors and dumps.
    pub name: &'static str,
    /// Fixed length in bytes.
    pub length: usize,
    /// Fields in offset order.
    pub fields: &'static [Field],
}

impl Layout {
    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// A decoded field value, for dumps and generic inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Unsigned integer.
    Unsigned(u64),
    /// Signed integer.
    Signed(i64),
    /// Trimmed text.
    Text(String),
    /// Zoned decimal; absent when the text is not all digits.
    Zoned(Option<BigUint>),
    /// `*DTS` timestamp; absent when zero or out of range.
    Timestamp(Option<DateTime<Utc>>),
    /// Host timestamp; absent when blank or malformed.
    HostTimestamp(Option<NaiveDateTime>),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{}", v),
            FieldValue::Signed(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{:?}", v),
            FieldValue::Zoned(Some(v)) => write!(f, "{}", v),
            FieldValue::Timestamp(Some(v)) => write!(f, "{}", v.to_rfc3339()),
            FieldValue::HostTimestamp(Some(v)) => write!(f, "{}", v),
            FieldValue::Zoned(None) | FieldValue::Timestamp(None) | FieldValue::HostTimestamp(None) => {
                write!(f, "-")
            }
            FieldValue::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

/// Reads the fields of one structure instance.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    base: usize,
    ccsid: Ccsid,
}

impl<'a> FieldReader<'a> {
    /// Positions a reader at `base`, failing if the buffer cannot hold the
    /// whole structure.
    pub fn new(
        layout: &Layout,
        buffer: &'a [u8],
        base: usize,
        ccsid: Ccsid,
    ) -> Result<Self, DecodeError> {
        let available = buffer.len().saturating_sub(base);
        let bytes = base
            .checked_add(layout.length)
            .and_then(|end| buffer.get(base..end))
            .ok_or(DecodeError::BufferTooShort {
                structure: layout.name,
                offset: base,
                needed: layout.length,
                available,
            })?;
        Ok(Self { bytes, base, ccsid })
    }

    /// Offset of the structure in the original buffer.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Text encoding applied to character fields.
    pub fn ccsid(&self) -> Ccsid {
        self.ccsid
    }

    /// Raw bytes of a field.
    pub fn bytes(&self, field: &Field) -> &'a [u8] {
        self.bytes.get(field.offset..field.end()).unwrap_or(&[])
    }

    /// Unsigned big-endian integer.
    pub fn unsigned(&self, field: &Field) -> u64 {
        self.bytes(field)
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }

    /// Signed big-endian integer, sign-extended from the field width.
    pub fn signed(&self, field: &Field) -> i64 {
        let raw = self.unsigned(field);
        let bits = field.width * 8;
        if bits == 0 || bits >= 64 {
            return raw as i64;
        }
        let shift = 64 - bits as u32;
        ((raw << shift) as i64) >> shift
    }

    /// 32-bit unsigned field.
    pub fn u32(&self, field: &Field) -> u32 {
        u32::try_from(self.unsigned(field)).unwrap_or(u32::MAX)
    }

    /// Text exactly as stored, padding included.
    pub fn raw_text(&self, field: &Field) -> String {
        self.ccsid.decode(self.bytes(field))
    }

    /// Text with its padding trimmed.
    pub fn text(&self, field: &Field) -> String {
        self.raw_text(field).trim().to_string()
    }

    /// First character of a text field, or a space when blank.
    pub fn char(&self, field: &Field) -> char {
        self.raw_text(field).chars().next().unwrap_or(' ')
    }

    /// Zoned decimal; `None` when the field is not all digits.
    pub fn zoned(&self, field: &Field) -> Option<BigUint> {
        parse_offset(&self.raw_text(field)).ok()
    }

    /// `*DTS` timestamp.
    pub fn dts(&self, field: &Field) -> Option<DateTime<Utc>> {
        from_dts(self.unsigned(field))
    }

    /// `CYYMMDDHHMMSS` timestamp.
    pub fn host_timestamp(&self, field: &Field) -> Option<NaiveDateTime> {
        parse_host_timestamp(&self.raw_text(field))
    }

    /// Decodes a field according to its declared kind.
    pub fn value(&self, field: &Field) -> FieldValue {
        match field.kind {
            FieldKind::Unsigned => FieldValue::Unsigned(self.unsigned(field)),
            FieldKind::Signed => FieldValue::Signed(self.signed(field)),
            FieldKind::Text => FieldValue::Text(self.text(field)),
            FieldKind::Zoned => FieldValue::Zoned(self.zoned(field)),
            FieldKind::Dts => FieldValue::Timestamp(self.dts(field)),
            FieldKind::HostTimestamp => FieldValue::HostTimestamp(self.host_timestamp(field)),
            FieldKind::Bytes => FieldValue::Bytes(self.bytes(field).to_vec()),
        }
    }
}

/// Builds one structure instance field by field.
///
/// Unset bytes are zero; text fields are space padded in the writer's CCSID.
#[derive(Debug, Clone)]
pub struct FieldWriter {
    bytes: Vec<u8>,
    ccsid: Ccsid,
}

impl FieldWriter {
    /// Starts a zero-filled structure.
    pub fn new(layout: &Layout, ccsid: Ccsid) -> Self {
        Self {
            bytes: vec![0; layout.length],
            ccsid,
        }
    }

    fn slot(&mut self, field: &Field) -> &mut [u8] {
        let end = field.end().min(self.bytes.len());
        let start = field.offset.min(end);
        &mut self.bytes[start..end]
    }

    /// Writes an unsigned big-endian integer. High bytes that do not fit are
    /// rejected.
    pub fn unsigned(&mut self, field: &Field, value: u64) -> Result<&mut Self, DecodeError> {
        let encoded = value.to_be_bytes();
        let (high, low) = encoded.split_at(8usize.saturating_sub(field.width));
        if high.iter().any(|b| *b != 0) || low.len() != field.width {
            return Err(DecodeError::FieldOverflow {
                field: field.name,
                value: value.to_string(),
                width: field.width,
            });
        }
        self.slot(field).copy_from_slice(low);
        Ok(self)
    }

    /// Writes a signed big-endian integer.
    pub fn signed(&mut self, field: &Field, value: i64) -> Result<&mut Self, DecodeError> {
        let encoded = value.to_be_bytes();
        let skip = 8usize.saturating_sub(field.width);
        let bits = field.width * 8;
        let fits = (1..=8).contains(&field.width)
            && (bits == 64 || {
                let limit = 1i64 << (bits - 1);
                (-limit..limit).contains(&value)
            });
        if !fits {
            return Err(DecodeError::FieldOverflow {
                field: field.name,
                value: value.to_string(),
                width: field.width,
            });
        }
        self.slot(field).copy_from_slice(&encoded[skip..]);
        Ok(self)
    }

    /// Writes space-padded text, truncated to the field width.
    pub fn text(&mut self, field: &Field, value: &str) -> &mut Self {
        let encoded = self.ccsid.encode_padded(value, field.width);
        self.slot(field).copy_from_slice(&encoded);
        self
    }

    /// Writes a zero-padded zoned decimal.
    pub fn zoned(&mut self, field: &Field, value: &BigUint) -> Result<&mut Self, DecodeError> {
        let digits = value.to_str_radix(10);
        if digits.len() > field.width {
            return Err(DecodeError::FieldOverflow {
                field: field.name,
                value: digits,
                width: field.width,
            });
        }
        let padded = format!("{:0>width$}", digits, width = field.width);
        Ok(self.text(field, &padded))
    }

    /// Writes a `*DTS` timestamp; `None` leaves the field zero.
    pub fn dts(&mut self, field: &Field, value: Option<&DateTime<Utc>>) -> Result<&mut Self, DecodeError> {
        match value {
            None => self.unsigned(field, 0),
            Some(ts) => {
                let raw = to_dts(ts).ok_or_else(|| DecodeError::FieldOverflow {
                    field: field.name,
                    value: ts.to_rfc3339(),
                    width: field.width,
                })?;
                self.unsigned(field, raw)
            }
        }
    }

    /// Writes a host timestamp; `None` leaves the field blank.
    pub fn host_timestamp(
        &mut self,
        field: &Field,
        value: Option<&NaiveDateTime>,
    ) -> Result<&mut Self, DecodeError> {
        let text = match value {
            None => String::new(),
            Some(ts) => format_host_timestamp(ts).ok_or_else(|| DecodeError::FieldOverflow {
                field: field.name,
                value: ts.to_string(),
                width: field.width,
            })?,
        };
        Ok(self.text(field, &text))
    }

    /// Copies raw bytes, truncated or zero padded to the field width.
    pub fn bytes(&mut self, field: &Field, value: &[u8]) -> &mut Self {
        let slot = self.slot(field);
        let len = value.len().min(slot.len());
        slot[..len].copy_from_slice(&value[..len]);
        slot[len..].fill(0);
        self
    }

    /// Returns the encoded structure.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
