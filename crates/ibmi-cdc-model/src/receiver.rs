use crate::identifiers::JournalReceiver;
use crate::position::offset_string;
use chrono::NaiveDateTime;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Width of the host receiver-number field that carries the chain position.
pub const CHAIN_POSITION_WIDTH: usize = 5;

/// Receiver status as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JournalStatus {
    /// Currently attached; the journal is writing into it.
    Attached,
    /// Detached, still online, not yet saved.
    OnlineSavedDetached,
    /// Saved after detach; storage not freed.
    SavedDetachedNotFreed,
    /// Saved after detach; storage freed. Entries are gone.
    SavedDetachedFreed,
    /// Partial receiver (restored or remote with missing entries).
    Partial,
    /// Never attached.
    Empty,
}

impl JournalStatus {
    /// Maps the host status character (`'1'..='6'`).
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(JournalStatus::Attached),
            '2' => Some(JournalStatus::OnlineSavedDetached),
            '3' => Some(JournalStatus::SavedDetachedNotFreed),
            '4' => Some(JournalStatus::SavedDetachedFreed),
            '5' => Some(JournalStatus::Partial),
            '6' => Some(JournalStatus::Empty),
            _ => None,
        }
    }

    /// Returns the host status character.
    pub fn code(self) -> char {
        match self {
            JournalStatus::Attached => '1',
            JournalStatus::OnlineSavedDetached => '2',
            JournalStatus::SavedDetachedNotFreed => '3',
            JournalStatus::SavedDetachedFreed => '4',
            JournalStatus::Partial => '5',
            JournalStatus::Empty => '6',
        }
    }

    /// Joined receivers still hold readable entries.
    pub fn is_joined(self) -> bool {
        matches!(
            self,
            JournalStatus::Attached
                | JournalStatus::OnlineSavedDetached
                | JournalStatus::SavedDetachedNotFreed
        )
    }
}

/// Parses the chain position from the host receiver-number field.
///
/// The value only counts when the trimmed field is exactly five digits.
pub fn parse_chain_position(field: &str) -> Option<u32> {
    let trimmed = field.trim();
    if trimmed.len() != CHAIN_POSITION_WIDTH || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Summary metadata for one receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalReceiverInfo {
    /// Receiver identity.
    pub receiver: JournalReceiver,
    /// When the receiver was attached; absent for receivers never attached.
    pub attach_time: Option<NaiveDateTime>,
    /// Current status.
    pub status: JournalStatus,
    /// Position of the receiver in its chain, when the host reports one.
    #[serde(default)]
    pub chain_position: Option<u32>,
}

/// Receiver metadata including the entry range and the successor edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedJournalReceiver {
    /// Summary metadata.
    pub info: JournalReceiverInfo,
    /// First sequence number in the receiver.
    #[serde(with = "offset_string")]
    pub start: BigUint,
    /// Last sequence number in the receiver.
    #[serde(with = "offset_string")]
    pub end: BigUint,
    /// Successor in the rollover sequence, if one has been attached.
    #[serde(default)]
    pub next_receiver: Option<JournalReceiver>,
    /// Longest entry the receiver holds, in bytes.
    #[serde(default)]
    pub max_entry_length: u32,
    /// Number of entries in the receiver.
    #[serde(with = "offset_string")]
    pub entry_count: BigUint,
}

impl DetailedJournalReceiver {
    /// The receiver identity.
    pub fn receiver(&self) -> &JournalReceiver {
        &self.info.receiver
    }

    /// Whether the receiver is still readable.
    pub fn is_joined(&self) -> bool {
        self.info.status.is_joined()
    }

    /// Whether every entry up to and including `offset` has been read.
    pub fn is_drained_at(&self, offset: &BigUint) -> bool {
        offset >= &self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in ['1', '2', '3', '4', '5', '6'] {
            let status = JournalStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(JournalStatus::from_code('0').is_none());
        assert!(JournalStatus::from_code(' ').is_none());
    }

    #[test]
    fn only_first_three_statuses_are_joined() {
        assert!(JournalStatus::Attached.is_joined());
        assert!(JournalStatus::OnlineSavedDetached.is_joined());
        assert!(JournalStatus::SavedDetachedNotFreed.is_joined());
        assert!(!JournalStatus::SavedDetachedFreed.is_joined());
        assert!(!JournalStatus::Partial.is_joined());
        assert!(!JournalStatus::Empty.is_joined());
    }

    #[test]
    fn chain_position_requires_five_digits() {
        assert_eq!(parse_chain_position("00012"), Some(12));
        assert_eq!(parse_chain_position("12   "), None);
        assert_eq!(parse_chain_position("     "), None);
        assert_eq!(parse_chain_position("0001A"), None);
    }
}
