//! Dump command implementation.

use crate::output;
use ibmi_cdc_journal::diagnostics;
use std::fs;

pub fn run(
    file: String,
    offset: usize,
    len: Option<usize>,
    ccsid: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let ccsid = output::parse_ccsid(ccsid)?;
    let bytes = fs::read(&file).map_err(|e| format!("Failed to read file: {}: {}", file, e))?;

    if offset > bytes.len() {
        return Err(format!("Offset {} is past the end of the {}-byte file", offset, bytes.len()).into());
    }
    let end = match len {
        Some(len) => offset.saturating_add(len).min(bytes.len()),
        None => bytes.len(),
    };

    print!("{}", diagnostics::dump(&bytes[offset..end], offset, ccsid));
    Ok(())
}
