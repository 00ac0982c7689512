//! Output formatting utilities.

use chrono::{DateTime, SecondsFormat, Utc};
use ibmi_cdc_journal::{Ccsid, JournalEntry};
use serde::Serialize;

/// Maps a `--ccsid` value.
pub fn parse_ccsid(code: u16) -> Result<Ccsid, String> {
    Ccsid::from_code(code).ok_or_else(|| format!("Unsupported CCSID {} (use 37, 1208 or 1200)", code))
}

/// Formats a value as pretty JSON.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a timestamp, `-` when absent.
pub fn format_time(time: Option<&DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true))
        .unwrap_or_else(|| "-".to_string())
}

/// Prints the entry table header.
#[allow(clippy::print_literal)]
pub fn print_entry_header() {
    println!(
        "{:>8} {:>12} {:<4} {:<20} {:<27} {:>6} {}",
        "OFFSET", "SEQUENCE", "CODE", "CLASS", "TIMESTAMP", "ROW", "TABLE"
    );
    println!("{}", "-".repeat(100));
}

/// Formats an entry as a table row.
pub fn format_entry_row(entry: &JournalEntry<'_>) -> String {
    let class = entry
        .entry_type()
        .map(|t| format!("{:?}", t))
        .unwrap_or_else(|| "(unclassified)".to_string());
    let code = format!("{}{}", entry.header.journal_code, entry.header.entry_type);
    let table = if entry.header.object.is_empty() {
        "-".to_string()
    } else {
        entry.header.object.qualified_table()
    };
    format!(
        "{:>8} {:>12} {:<4} {:<20} {:<27} {:>6} {}",
        entry.offset,
        entry.header.sequence_number,
        code,
        truncate(&class, 20),
        format_time(entry.header.timestamp.as_ref()),
        entry.row_data().len(),
        table
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}
