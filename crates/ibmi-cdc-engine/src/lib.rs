//! Forward-only change capture over an IBM i journal.
//!
//! This crate provides:
//! - `HostConnection` and `EntrySink` traits for the host and the consumer
//! - the receiver chain builder (available receivers, chains, last joined run)
//! - `RetrievalEngine`, which pages through retrieval responses, follows
//!   receiver rollover and recovers from lost positions
//! - client-side entry filters
//! - checkpoint persistence, TOML configuration and a stall watchdog
//!
//! Decoding lives in `ibmi-cdc-journal`; this crate never parses bytes
//! itself.

#![deny(missing_docs)]

/// Receiver directory and chain builder.
pub mod chain;
/// Checkpoint persistence.
pub mod checkpoint;
/// Capture configuration.
pub mod config;
/// The retrieval engine.
pub mod engine;
/// Error types for engine operations.
pub mod error;
/// Change events.
pub mod event;
/// Entry filtering API.
pub mod filter;
/// Host and sink traits.
pub mod traits;
/// Stall watchdog and cancellation.
pub mod watchdog;

pub use chain::{
    available_receivers, find_chain_containing, last_joined, link_chain, unreachable,
    LinkedChains, ReceiverDirectory,
};
pub use checkpoint::CheckpointFile;
pub use config::{CaptureConfig, HostConfig};
pub use engine::{EngineOptions, EngineState, LostJournalReport, PollOutcome, RetrievalEngine};
pub use error::{ChainError, CheckpointError, ConfigError, EngineError, HostError, SinkError};
pub use event::ChangeEvent;
pub use filter::{AndFilter, EntryFilter, EntryTypeFilter, FileFilter, IncludeFilter};
pub use ibmi_cdc_journal::Ccsid;
pub use traits::{EntrySink, HostConnection};
pub use watchdog::{CancellationToken, Heartbeat, Watchdog};
