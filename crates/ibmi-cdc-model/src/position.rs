use crate::identifiers::JournalReceiver;
use crate::validation::ValidationError;
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parses a decimal offset as sent by the host.
///
/// Leading and trailing spaces are ignored (host fields are space padded);
/// leading zeros are accepted. Anything else that is not a digit is rejected.
pub fn parse_offset(text: &str) -> Result<BigUint, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::PatternMismatch {
            field: "offset",
            value: text.to_string(),
        });
    }
    BigUint::parse_bytes(trimmed.as_bytes(), 10).ok_or_else(|| ValidationError::PatternMismatch {
        field: "offset",
        value: text.to_string(),
    })
}

/// Serde adapter that writes offsets as decimal strings.
pub mod offset_string {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an offset as a decimal string.
    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    /// Deserializes an offset from a decimal string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_offset(&text).map_err(serde::de::Error::custom)
    }
}

/// An exact entry offset inside one journal receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JournalPosition {
    /// Receiver the offset refers to.
    pub receiver: JournalReceiver,
    /// Offset (journal sequence number) inside the receiver.
    #[serde(with = "offset_string")]
    pub offset: BigUint,
}

impl JournalPosition {
    /// Creates a position.
    pub fn new(receiver: JournalReceiver, offset: impl Into<BigUint>) -> Self {
        Self {
            receiver,
            offset: offset.into(),
        }
    }

    /// Returns the position of the entry after this one in the same receiver.
    pub fn next(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            offset: self.offset.clone() + 1u32,
        }
    }

    /// Returns true for the "start of journal" sentinel (no receiver).
    pub fn is_start_of_journal(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl fmt::Display for JournalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_start_of_journal() {
            return write!(f, "*FIRST");
        }
        write!(f, "{}:{}", self.receiver, self.offset)
    }
}

/// The persisted checkpoint.
///
/// With `processed == false` the position is the next entry to read. With
/// `processed == true` it is the last entry successfully applied, so reading
/// resumes one past it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalProcessedPosition {
    /// Receiver and offset.
    #[serde(flatten)]
    pub position: JournalPosition,
    /// Host time of the last applied entry, if any entry was applied.
    pub last_processed_time: Option<DateTime<Utc>>,
    /// Whether the entry at `position` has already been applied.
    pub processed: bool,
}

impl JournalProcessedPosition {
    /// Checkpoint meaning "read from the first entry of the current chain".
    pub fn start_of_journal() -> Self {
        Self::default()
    }

    /// Checkpoint pointing at an entry that has not been read yet.
    pub fn unprocessed(position: JournalPosition) -> Self {
        Self {
            position,
            last_processed_time: None,
            processed: false,
        }
    }

    /// Checkpoint recording that the entry at `position` was applied.
    pub fn processed_at(position: JournalPosition, time: Option<DateTime<Utc>>) -> Self {
        Self {
            position,
            last_processed_time: time,
            processed: true,
        }
    }

    /// The receiver this checkpoint refers to.
    pub fn receiver(&self) -> &JournalReceiver {
        &self.position.receiver
    }

    /// The offset this checkpoint refers to.
    pub fn offset(&self) -> &BigUint {
        &self.position.offset
    }

    /// Returns the position the next retrieval call must start from.
    pub fn next_to_read(&self) -> JournalPosition {
        if self.processed {
            self.position.next()
        } else {
            self.position.clone()
        }
    }

    /// Returns true for the start-of-journal sentinel.
    pub fn is_start_of_journal(&self) -> bool {
        self.position.is_start_of_journal()
    }
}

impl fmt::Display for JournalProcessedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.processed { "processed" } else { "pending" };
        write!(f, "{} ({})", self.position, state)
    }
}
