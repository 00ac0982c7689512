//! Error types for the retrieval engine and its collaborators.

use ibmi_cdc_journal::DecodeError;
use ibmi_cdc_model::{JournalPosition, JournalReceiver};
use thiserror::Error;

/// Failures reported by a [`HostConnection`](crate::HostConnection).
#[derive(Error, Debug)]
pub enum HostError {
    /// The requested position no longer exists on the host (receiver deleted
    /// or entries freed). Drives lost-journal recovery.
    #[error("position {position} is no longer available: {reason}")]
    PositionUnavailable {
        /// Position that was requested.
        position: JournalPosition,
        /// Host message.
        reason: String,
    },
    /// I/O error talking to the host.
    #[error("host I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other host failure.
    #[error("host call failed: {0}")]
    Failed(String),
}

/// Failures reported by an [`EntrySink`](crate::EntrySink).
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink refused an entry.
    #[error("entry {sequence} rejected: {reason}")]
    Rejected {
        /// Sequence number of the refused entry.
        sequence: u64,
        /// Why it was refused.
        reason: String,
    },
    /// I/O error inside the sink.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inconsistent receiver metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Following successor links leads back to a receiver already visited.
    #[error("receiver chain through {receiver} is cyclic")]
    Cycle {
        /// A receiver on the cycle.
        receiver: JournalReceiver,
    },
    /// Two receivers name the same successor.
    #[error("{first} and {second} both name {successor} as their successor")]
    Branch {
        /// The shared successor.
        successor: JournalReceiver,
        /// First predecessor found.
        first: JournalReceiver,
        /// Second predecessor found.
        second: JournalReceiver,
    },
    /// No attached or detached-but-readable receiver follows the last gap.
    #[error("no usable receivers: every receiver is freed, partial or never attached")]
    NoUsableReceivers,
}

/// Checkpoint persistence failures.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// I/O error reading or writing the checkpoint file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The checkpoint file is not a valid checkpoint.
    #[error("invalid checkpoint: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but is not acceptable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors that end a poll.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Host failure other than a lost position.
    #[error("host error: {0}")]
    Host(#[from] HostError),
    /// The host returned a buffer that does not decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Receiver metadata is inconsistent.
    #[error("receiver chain error: {0}")]
    Chain(#[from] ChainError),
    /// The sink refused an entry; the checkpoint stays before it.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    /// The checkpoint could not be persisted.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    /// An entry carried no receiver record and no listed receiver holds its
    /// sequence number.
    #[error("no receiver holds sequence number {sequence}")]
    UnresolvedReceiver {
        /// Sequence number of the entry.
        sequence: u64,
    },
    /// The journal position was lost and an operator has not acknowledged
    /// the resync yet.
    #[error("journal position lost; resync required before polling again")]
    ResyncRequired,
    /// The cancellation token was tripped.
    #[error("poll cancelled")]
    Cancelled,
}
