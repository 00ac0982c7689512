//! Decoders for IBM i journal retrieval.
//!
//! This crate turns raw host buffers into typed values:
//! - the retrieval response header and its entry chain ([`EntryBuffer`])
//! - entry headers, row images and null indicators ([`EntryHeader`])
//! - receiver detail records ([`ReceiverDetail`])
//! - request key lists ([`RetrievalRequest`])
//!
//! Every structure is a declarative field table ([`layout::Layout`]) applied
//! by one generic reader, so a buffer shorter than the structure fails with
//! [`DecodeError::BufferTooShort`] instead of reading out of bounds.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ibmi_cdc_journal::{Ccsid, EntryBuffer, ReadMode};
//!
//! let bytes = std::fs::read("response.bin")?;
//! let buffer = EntryBuffer::parse(bytes, Ccsid::Ebcdic37)?;
//! for entry in buffer.entries(ReadMode::Strict) {
//!     let entry = entry?;
//!     if let Some(class) = entry.entry_type() {
//!         println!("{} {} {}", entry.header.sequence_number, class, entry.header.object.qualified_table());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

/// Hex/EBCDIC dumps and dump files.
pub mod diagnostics;
/// Entry header and variable-length entry areas.
pub mod entry;
/// Entry classification.
pub mod entry_type;
/// Error types for decoding.
pub mod errors;
/// Retrieval response header.
pub mod header;
/// Key records and retrieval requests.
pub mod key;
/// Field tables and the generic field reader/writer.
pub mod layout;
/// Entry buffer reader.
pub mod reader;
/// Receiver records.
pub mod receiver;
/// Host text encodings.
pub mod text;
/// Synthetic response builders.
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use entry::{entry_end_offset, EntryHeader, JournalObject};
pub use entry_type::{JournalEntryType, RowOperation};
pub use errors::DecodeError;
pub use header::{FirstHeader, OffsetStatus};
pub use key::{FileSelection, KeyRecord, RetrievalRequest, SelectionKey};
pub use reader::{EntryBuffer, JournalEntry, ReadMode};
pub use receiver::{ReceiverDetail, ReceiverName};
pub use text::Ccsid;
