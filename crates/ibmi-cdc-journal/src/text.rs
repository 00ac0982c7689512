//! Host text encodings.
//!
//! Journal character fields are fixed width and space padded in the CCSID of
//! the job that retrieved them. Decoding never fails: bytes that do not map
//! are replaced, because a bad byte in a job name must not sink an entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EBCDIC code page 037 (US/Canada) to Unicode.
#[rustfmt::skip]
const CP037: [u16; 256] = [
    0x0000, 0x0001, 0x0002, 0x0003, 0x009C, 0x0009, 0x0086, 0x007F, 0x0097, 0x008D, 0x008E, 0x000B, 0x000C, 0x000D, 0x000E, 0x000F,
    0x0010, 0x0011, 0x0012, 0x0013, 0x009D, 0x0085, 0x0008, 0x0087, 0x0018, 0x0019, 0x0092, 0x008F, 0x001C, 0x001D, 0x001E, 0x001F,
    0x0080, 0x0081, 0x0082, 0x0083, 0x0084, 0x000A, 0x0017, 0x001B, 0x0088, 0x0089, 0x008A, 0x008B, 0x008C, 0x0005, 0x0006, 0x0007,
    0x0090, 0x0091, 0x0016, 0x0093, 0x0094, 0x0095, 0x0096, 0x0004, 0x0098, 0x0099, 0x009A, 0x009B, 0x0014, 0x0015, 0x009E, 0x001A,
    0x0020, 0x00A0, 0x00E2, 0x00E4, 0x00E0, 0x00E1, 0x00E3, 0x00E5, 0x00E7, 0x00F1, 0x00A2, 0x002E, 0x003C, 0x0028, 0x002B, 0x007C,
    0x0026, 0x00E9, 0x00EA, 0x00EB, 0x00E8, 0x00ED, 0x00EE, 0x00EF, 0x00EC, 0x00DF, 0x0021, 0x0024, 0x002A, 0x0029, 0x003B, 0x00AC,
    0x002D, 0x002F, 0x00C2, 0x00C4, 0x00C0, 0x00C1, 0x00C3, 0x00C5, 0x00C7, 0x00D1, 0x00A6, 0x002C, 0x0025, 0x005F, 0x003E, 0x003F,
    0x00F8, 0x00C9, 0x00CA, 0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x0060, 0x003A, 0x0023, 0x0040, 0x0027, 0x003D, 0x0022,
    0x00D8, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x00AB, 0x00BB, 0x00F0, 0x00FD, 0x00FE, 0x00B1,
    0x00B0, 0x006A, 0x006B, 0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x00AA, 0x00BA, 0x00E6, 0x00B8, 0x00C6, 0x00A4,
    0x00B5, 0x007E, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077, 0x0078, 0x0079, 0x007A, 0x00A1, 0x00BF, 0x00D0, 0x00DD, 0x00DE, 0x00AE,
    0x005E, 0x00A3, 0x00A5, 0x00B7, 0x00A9, 0x00A7, 0x00B6, 0x00BC, 0x00BD, 0x00BE, 0x005B, 0x005D, 0x00AF, 0x00A8, 0x00B4, 0x00D7,
    0x007B, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047, 0x0048, 0x0049, 0x00AD, 0x00F4, 0x00F6, 0x00F2, 0x00F3, 0x00F5,
    0x007D, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x00B9, 0x00FB, 0x00FC, 0x00F9, 0x00FA, 0x00FF,
    0x005C, 0x00F7, 0x0053, 0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x00B2, 0x00D4, 0x00D6, 0x00D2, 0x00D3, 0x00D5,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x00B3, 0x00DB, 0x00DC, 0x00D9, 0x00DA, 0x009F,
];

/// EBCDIC `?`, used for characters code page 037 cannot represent.
const EBCDIC_SUBSTITUTE: u8 = 0x6F;

/// Coded character set identifier of host text fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Ccsid {
    /// CCSID 37: EBCDIC US/Canada, single byte.
    #[default]
    Ebcdic37,
    /// CCSID 1208: UTF-8.
    Utf8,
    /// CCSID 1200: UTF-16 big-endian.
    Utf16Be,
}

impl Ccsid {
    /// Maps a numeric CCSID.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            37 => Some(Ccsid::Ebcdic37),
            1208 => Some(Ccsid::Utf8),
            1200 | 13488 => Some(Ccsid::Utf16Be),
            _ => None,
        }
    }

    /// Numeric CCSID.
    pub fn code(self) -> u16 {
        match self {
            Ccsid::Ebcdic37 => 37,
            Ccsid::Utf8 => 1208,
            Ccsid::Utf16Be => 1200,
        }
    }

    /// Decodes host bytes. Unmappable input is replaced with U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Ccsid::Ebcdic37 => bytes
                .iter()
                .map(|b| char::from_u32(u32::from(CP037[usize::from(*b)])).unwrap_or('\u{FFFD}'))
                .collect(),
            Ccsid::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Ccsid::Utf16Be => char::decode_utf16(
                bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
            )
            .map(|c| c.unwrap_or('\u{FFFD}'))
            .collect(),
        }
    }

    /// Encodes text. Characters code page 037 cannot hold become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Ccsid::Ebcdic37 => text.chars().map(encode_cp037).collect(),
            Ccsid::Utf8 => text.as_bytes().to_vec(),
            Ccsid::Utf16Be => text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect(),
        }
    }

    /// Encodes text into exactly `width` bytes, space padded on the right.
    ///
    /// Longer text is cut at the last whole character that fits.
    pub fn encode_padded(self, text: &str, width: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(width);
        for c in text.chars() {
            let mut buf = [0u8; 4];
            let encoded = self.encode(c.encode_utf8(&mut buf));
            if out.len() + encoded.len() > width {
                break;
            }
            out.extend_from_slice(&encoded);
        }
        let space = self.encode(" ");
        while out.len() + space.len() <= width {
            out.extend_from_slice(&space);
        }
        out.resize(width, 0);
        out
    }

    /// Whether a decoded character is safe to print in a dump.
    pub fn is_printable(c: char) -> bool {
        !c.is_control() && c != '\u{FFFD}'
    }
}

fn encode_cp037(c: char) -> u8 {
    let code = u32::from(c);
    CP037
        .iter()
        .position(|unit| u32::from(*unit) == code)
        .and_then(|index| u8::try_from(index).ok())
        .unwrap_or(EBCDIC_SUBSTITUTE)
}

impl TryFrom<u16> for Ccsid {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Ccsid::from_code(code).ok_or_else(|| format!("unsupported CCSID {}", code))
    }
}

impl From<Ccsid> for u16 {
    fn from(ccsid: Ccsid) -> Self {
        ccsid.code()
    }
}

impl fmt::Display for Ccsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ebcdic_letters_digits_and_space() {
        let bytes = [0xC1, 0xC2, 0xE9, 0x81, 0xA9, 0xF0, 0xF9, 0x40];
        assert_eq!(Ccsid::Ebcdic37.decode(&bytes), "ABZaz09 ");
    }

    #[test]
    fn ebcdic_table_is_a_bijection() {
        let mut seen = std::collections::HashSet::new();
        for unit in CP037 {
            assert!(seen.insert(unit), "duplicate mapping for U+{:04X}", unit);
        }
        for byte in 0u8..=255 {
            let text = Ccsid::Ebcdic37.decode(&[byte]);
            assert_eq!(Ccsid::Ebcdic37.encode(&text), vec![byte]);
        }
    }

    #[test]
    fn ebcdic_substitutes_unmappable_characters() {
        assert_eq!(Ccsid::Ebcdic37.encode("A\u{4E2D}"), vec![0xC1, EBCDIC_SUBSTITUTE]);
    }

    #[test]
    fn padded_encoding_fills_with_spaces() {
        assert_eq!(
            Ccsid::Ebcdic37.encode_padded("AB", 4),
            vec![0xC1, 0xC2, 0x40, 0x40]
        );
        assert_eq!(Ccsid::Utf8.encode_padded("ABCDEF", 3), b"ABC".to_vec());
        assert_eq!(
            Ccsid::Utf16Be.encode_padded("A", 4),
            vec![0x00, 0x41, 0x00, 0x20]
        );
    }

    #[test]
    fn utf16_decoding_replaces_lone_surrogates() {
        let bytes = [0x00, 0x41, 0xD8, 0x00];
        assert_eq!(Ccsid::Utf16Be.decode(&bytes), "A\u{FFFD}");
    }

    #[test]
    fn ccsid_codes() {
        assert_eq!(Ccsid::from_code(37), Some(Ccsid::Ebcdic37));
        assert_eq!(Ccsid::from_code(1208), Some(Ccsid::Utf8));
        assert_eq!(Ccsid::from_code(1200), Some(Ccsid::Utf16Be));
        assert_eq!(Ccsid::from_code(500), None);
    }
}
