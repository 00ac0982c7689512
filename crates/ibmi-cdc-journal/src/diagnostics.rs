//! Hex and EBCDIC renderings of raw buffers.
//!
//! Used when a buffer fails to decode: the bytes are rendered for a human
//! and optionally written next to a `.bin` copy of the buffer. Nothing here
//! feeds back into decoding.

use crate::errors::DecodeError;
use crate::layout::{FieldReader, FieldValue, Layout};
use crate::text::Ccsid;
use chrono::Utc;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bytes per dump row.
pub const ROW_WIDTH: usize = 16;

/// Renders bytes as text with non-printable characters as `.`.
pub fn render_text(bytes: &[u8], ccsid: Ccsid) -> String {
    bytes
        .iter()
        .map(|b| {
            let decoded = match ccsid {
                Ccsid::Ebcdic37 => Ccsid::Ebcdic37.decode(&[*b]),
                Ccsid::Utf8 | Ccsid::Utf16Be => char::from(*b).to_string(),
            };
            match decoded.chars().next() {
                Some(c) if Ccsid::is_printable(c) && (ccsid == Ccsid::Ebcdic37 || b.is_ascii()) => c,
                _ => '.',
            }
        })
        .collect()
}

/// Renders a byte range, 16 bytes per row: offset, hex, text.
///
/// `origin` is the offset of `bytes[0]` in the original buffer and is what
/// the offset column shows.
pub fn dump(bytes: &[u8], origin: usize, ccsid: Ccsid) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(ROW_WIDTH).enumerate() {
        let hex = hex::encode_upper(chunk);
        let mut spaced = String::with_capacity(ROW_WIDTH * 3);
        for (index, pair) in hex.as_bytes().chunks(2).enumerate() {
            if index > 0 {
                spaced.push(' ');
            }
            spaced.push_str(std::str::from_utf8(pair).unwrap_or("??"));
        }
        let _ = writeln!(
            out,
            "{:08X}  {:<width$}  |{}|",
            origin + row * ROW_WIDTH,
            spaced,
            render_text(chunk, ccsid),
            width = ROW_WIDTH * 3 - 1
        );
    }
    out
}

/// Decodes one structure field by field, for inspection.
pub fn describe(
    layout: &Layout,
    buffer: &[u8],
    base: usize,
    ccsid: Ccsid,
) -> Result<Vec<(&'static str, FieldValue)>, DecodeError> {
    let reader = FieldReader::new(layout, buffer, base, ccsid)?;
    Ok(layout
        .fields
        .iter()
        .map(|field| (field.name, reader.value(field)))
        .collect())
}

/// Writes `<folder>/<label>-<utc>.bin` and a matching `.txt` dump.
///
/// Returns the path of the `.bin` file.
pub fn write_dump(folder: &Path, label: &str, bytes: &[u8], ccsid: Ccsid) -> io::Result<PathBuf> {
    fs::create_dir_all(folder)?;
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
    let stem = format!("{}-{}", sanitize(label), stamp);
    let bin = folder.join(format!("{}.bin", stem));
    let txt = folder.join(format!("{}.txt", stem));
    fs::write(&bin, bytes)?;
    fs::write(&txt, dump(bytes, 0, ccsid))?;
    Ok(bin)
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
