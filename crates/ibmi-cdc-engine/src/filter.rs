//! Client-side entry filtering.
//!
//! Filters only see entries that name a table; commit and receiver entries
//! always reach the sink.

use ibmi_cdc_journal::{FileSelection, JournalEntryType, JournalObject};
use serde::{Deserialize, Serialize};

/// Matches `*ALL` in either part of a [`FileFilter`].
pub const WILDCARD: &str = "*ALL";

/// Trait for filtering table entries during retrieval.
pub trait EntryFilter {
    /// Returns true if the entry should be emitted.
    fn admits(&self, entry_type: JournalEntryType, object: &JournalObject) -> bool;
}

/// One `library/file` to capture. Either part may be `*ALL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileFilter {
    /// Library name or `*ALL`.
    pub library: String,
    /// File name or `*ALL`.
    pub file: String,
}

impl FileFilter {
    /// Creates a filter for `library/file`.
    pub fn new(library: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            file: file.into(),
        }
    }

    /// Whether `object` is covered.
    pub fn matches(&self, object: &JournalObject) -> bool {
        part_matches(&self.library, &object.library) && part_matches(&self.file, &object.file)
    }

    /// The server-side selection for this filter, every member.
    pub fn to_selection(&self) -> FileSelection {
        FileSelection::all_members(self.library.clone(), self.file.clone())
    }
}

fn part_matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern.eq_ignore_ascii_case(value)
}

impl EntryFilter for FileFilter {
    fn admits(&self, _entry_type: JournalEntryType, object: &JournalObject) -> bool {
        self.matches(object)
    }
}

/// The configured include list. Empty means every table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeFilter {
    files: Vec<FileFilter>,
}

impl IncludeFilter {
    /// Creates an include list.
    pub fn new(files: Vec<FileFilter>) -> Self {
        Self { files }
    }

    /// The listed files.
    pub fn files(&self) -> &[FileFilter] {
        &self.files
    }

    /// Whether every table is included.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Server-side selections for the request.
    ///
    /// Wildcards cannot be expressed per file on the host, so a list that
    /// contains one selects nothing server-side and relies on this filter.
    pub fn selections(&self) -> Vec<FileSelection> {
        if self
            .files
            .iter()
            .any(|f| f.library == WILDCARD || f.file == WILDCARD)
        {
            return Vec::new();
        }
        self.files.iter().map(FileFilter::to_selection).collect()
    }
}

impl EntryFilter for IncludeFilter {
    fn admits(&self, _entry_type: JournalEntryType, object: &JournalObject) -> bool {
        self.files.is_empty() || self.files.iter().any(|f| f.matches(object))
    }
}

/// Emits only the listed entry classes.
#[derive(Debug, Clone)]
pub struct EntryTypeFilter {
    /// Classes to emit.
    pub entry_types: Vec<JournalEntryType>,
}

impl EntryFilter for EntryTypeFilter {
    fn admits(&self, entry_type: JournalEntryType, _object: &JournalObject) -> bool {
        self.entry_types.contains(&entry_type)
    }
}

/// Composite filter: all filters must admit (AND).
pub struct AndFilter {
    /// Filters to combine with AND logic.
    pub filters: Vec<Box<dyn EntryFilter + Send>>,
}

impl EntryFilter for AndFilter {
    fn admits(&self, entry_type: JournalEntryType, object: &JournalObject) -> bool {
        self.filters.iter().all(|f| f.admits(entry_type, object))
    }
}
