use serde::Serialize;
use std::fmt;

/// Row-level effect of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowOperation {
    /// A row was added.
    Insert,
    /// Image of a row before an update.
    UpdateBefore,
    /// Image of a row after an update.
    UpdateAfter,
    /// A row was removed.
    Delete,
}

/// Entry classes the reader understands, keyed by `(journal code, entry type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JournalEntryType {
    /// `R PT`
    AddRow,
    /// `R PX`
    AddRowByRrn,
    /// `R UB`
    BeforeUpdate,
    /// `R UP`
    AfterUpdate,
    /// `R BR`
    BeforeRollbackUpdate,
    /// `R UR`
    AfterRollbackUpdate,
    /// `R DL`
    DeleteRow,
    /// `R DR`
    RollbackDelete,
    /// `C SC`
    StartCommit,
    /// `C CM`
    Commit,
    /// `C RB`
    Rollback,
    /// `J NR`: the journal moved to a new receiver.
    NextReceiver,
    /// `J PR`: first entry of a receiver, naming its predecessor.
    PreviousReceiver,
    /// `D CT`
    TableCreated,
    /// `D CG`
    TableChanged,
    /// `D DF`
    TableDropped,
}

const TABLE: &[(JournalEntryType, char, &str)] = &[
    (JournalEntryType::AddRow, 'R', "PT"),
    (JournalEntryType::AddRowByRrn, 'R', "PX"),
    (JournalEntryType::BeforeUpdate, 'R', "UB"),
    (JournalEntryType::AfterUpdate, 'R', "UP"),
    (JournalEntryType::BeforeRollbackUpdate, 'R', "BR"),
    (JournalEntryType::AfterRollbackUpdate, 'R', "UR"),
    (JournalEntryType::DeleteRow, 'R', "DL"),
    (JournalEntryType::RollbackDelete, 'R', "DR"),
    (JournalEntryType::StartCommit, 'C', "SC"),
    (JournalEntryType::Commit, 'C', "CM"),
    (JournalEntryType::Rollback, 'C', "RB"),
    (JournalEntryType::NextReceiver, 'J', "NR"),
    (JournalEntryType::PreviousReceiver, 'J', "PR"),
    (JournalEntryType::TableCreated, 'D', "CT"),
    (JournalEntryType::TableChanged, 'D', "CG"),
    (JournalEntryType::TableDropped, 'D', "DF"),
];

impl JournalEntryType {
    /// Classifies an entry. Returns `None` for entries the reader skips.
    pub fn classify(journal_code: &str, entry_type: &str) -> Option<Self> {
        let mut code = journal_code.chars();
        let (Some(code), None) = (code.next(), code.next()) else {
            return None;
        };
        TABLE
            .iter()
            .find(|(_, c, t)| *c == code && *t == entry_type)
            .map(|(class, _, _)| *class)
    }

    /// Journal code.
    pub fn journal_code(self) -> char {
        self.row().1
    }

    /// Two-character entry type.
    pub fn entry_type(self) -> &'static str {
        self.row().2
    }

    fn row(self) -> (JournalEntryType, char, &'static str) {
        TABLE
            .iter()
            .copied()
            .find(|(class, _, _)| *class == self)
            .unwrap_or((self, '?', "??"))
    }

    /// Row-level effect, for record entries only.
    pub fn row_operation(self) -> Option<RowOperation> {
        use JournalEntryType::*;
        match self {
            AddRow | AddRowByRrn => Some(RowOperation::Insert),
            BeforeUpdate | BeforeRollbackUpdate => Some(RowOperation::UpdateBefore),
            AfterUpdate | AfterRollbackUpdate => Some(RowOperation::UpdateAfter),
            DeleteRow | RollbackDelete => Some(RowOperation::Delete),
            _ => None,
        }
    }

    /// Whether the entry names a table and is subject to include filters.
    pub fn is_table_scoped(self) -> bool {
        self.journal_code() == 'R' || self.journal_code() == 'D'
    }
}

impl fmt::Display for JournalEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.journal_code(), self.entry_type())
    }
}
