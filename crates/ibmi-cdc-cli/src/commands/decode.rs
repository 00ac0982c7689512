//! Decode command implementation.

use crate::output;
use ibmi_cdc_journal::{Ccsid, EntryBuffer, ReadMode, ReceiverDetail, RetrievalRequest};
use serde_json::json;
use std::fs;

/// Structure held by a buffer file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    /// A retrieval response (first header and entries).
    Entries,
    /// One receiver detail record.
    Receiver,
    /// A retrieval request key list.
    Request,
}

pub fn run(
    buffer: String,
    kind: Kind,
    ccsid: u16,
    json: bool,
    permissive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ccsid = output::parse_ccsid(ccsid)?;
    let bytes =
        fs::read(&buffer).map_err(|e| format!("Failed to read buffer file: {}: {}", buffer, e))?;
    tracing::debug!(path = %buffer, bytes = bytes.len(), ?kind, "decoding");

    match kind {
        Kind::Entries => {
            let mode = if permissive {
                ReadMode::Permissive
            } else {
                ReadMode::Strict
            };
            decode_entries(bytes, ccsid, json, mode)
        }
        Kind::Receiver => {
            let detail = ReceiverDetail::decode(&bytes, 0, ccsid)?;
            println!("{}", output::format_json(&detail));
            Ok(())
        }
        Kind::Request => {
            let request = RetrievalRequest::decode(&bytes, ccsid)?;
            println!("{}", output::format_json(&request));
            Ok(())
        }
    }
}

fn decode_entries(
    bytes: Vec<u8>,
    ccsid: Ccsid,
    json: bool,
    mode: ReadMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let buffer = EntryBuffer::parse(bytes, ccsid)?;
    let header = buffer.header();

    if json {
        println!("{}", serde_json::to_string(&json!({ "header": header }))?);
    } else {
        println!(
            "status: {:?}  entries: {}  bytes: {}",
            header.status, header.entry_count, header.total_bytes
        );
        if let Some(continuation) = &header.continuation {
            println!("continues at: {}", continuation);
        }
        output::print_entry_header();
    }

    let mut count = 0usize;
    for entry in buffer.entries(mode) {
        let entry = entry?;
        count += 1;
        if json {
            let line = json!({
                "offset": entry.offset,
                "class": entry.entry_type(),
                "header": &entry.header,
                "row_data": hex::encode_upper(entry.row_data()),
                "null_indicators": hex::encode_upper(entry.null_indicators()),
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{}", output::format_entry_row(&entry));
        }
    }

    if !json {
        println!();
        println!("Decoded {} of {} entries", count, header.entry_count);
    }
    Ok(())
}
