//! Value types shared by every stage of the IBM i journal reader.
//!
//! These types describe *where* the reader is in a journal: which receiver it
//! is reading, the offset inside that receiver, and whether the entry at that
//! offset has already been applied. Receiver metadata returned by the host
//! (status, attach time, successor) lives here too, since both the decoders and
//! the chain builder depend on it.
//!
//! Offsets are unbounded integers. The host reports them as decimal text and
//! long-lived journals can exceed 64 bits, so nothing in this crate narrows
//! them.
//!
#![deny(missing_docs)]

/// Object names, journal identities and receiver identities.
pub mod identifiers;
/// Journal positions and the persisted processed-position checkpoint.
pub mod position;
/// Receiver status and receiver metadata records.
pub mod receiver;
/// Host timestamp encodings (`CYYMMDDHHMMSS` text and `*DTS` clock values).
pub mod timestamp;
/// Validation helpers used by model types.
pub mod validation;

pub use identifiers::{JournalId, JournalReceiver, ObjectName};
pub use position::{parse_offset, JournalPosition, JournalProcessedPosition};
pub use receiver::{
    parse_chain_position, DetailedJournalReceiver, JournalReceiverInfo, JournalStatus,
};
pub use timestamp::{format_host_timestamp, from_dts, parse_host_timestamp, to_dts};
pub use validation::ValidationError;

/// Arbitrary-precision unsigned integer used for journal offsets.
pub use num_bigint::BigUint;
