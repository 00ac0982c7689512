//! Capture configuration loaded from TOML.
//!
//! ```toml
//! ccsid = 37
//! max_entries_per_call = 500
//! checkpoint_path = "/var/lib/ibmi-cdc/orders.json"
//!
//! [journal]
//! name = "QSQJRN"
//! library = "APPDATA"
//!
//! [[include]]
//! library = "APPDATA"
//! file = "ORDERS"
//! ```

use crate::checkpoint::CheckpointFile;
use crate::engine::EngineOptions;
use crate::error::ConfigError;
use crate::filter::{FileFilter, IncludeFilter, WILDCARD};
use ibmi_cdc_journal::Ccsid;
use ibmi_cdc_model::{JournalId, ObjectName};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default for [`CaptureConfig::max_entries_per_call`].
pub const DEFAULT_MAX_ENTRIES_PER_CALL: u32 = 1000;
/// Default for [`CaptureConfig::max_pages_per_poll`].
pub const DEFAULT_MAX_PAGES_PER_POLL: u32 = 16;

/// Host endpoint settings. Passed through to the host connection; the
/// engine does not read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host name or address.
    pub endpoint: String,
    /// User profile to sign on with.
    #[serde(default)]
    pub user: Option<String>,
    /// Name of the environment variable holding the password.
    #[serde(default)]
    pub password_env: Option<String>,
}

/// Settings for one capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Journal to read.
    pub journal: JournalId,
    /// Tables to capture; empty captures every table.
    #[serde(default)]
    pub include: Vec<FileFilter>,
    /// Text encoding of host buffers.
    #[serde(default)]
    pub ccsid: Ccsid,
    /// Entries requested per retrieval call.
    #[serde(default = "default_max_entries_per_call")]
    pub max_entries_per_call: u32,
    /// Retrieval calls per poll before yielding.
    #[serde(default = "default_max_pages_per_poll")]
    pub max_pages_per_poll: u32,
    /// Folder for malformed buffer dumps.
    #[serde(default)]
    pub dump_folder: Option<PathBuf>,
    /// Stall timeout for the watchdog; no watchdog when absent.
    #[serde(default)]
    pub watchdog_timeout_secs: Option<u64>,
    /// Where the checkpoint is persisted.
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,
    /// Whether checkpoint writes are fsynced.
    #[serde(default)]
    pub sync_checkpoint: bool,
    /// Host endpoint.
    #[serde(default)]
    pub host: Option<HostConfig>,
}

fn default_max_entries_per_call() -> u32 {
    DEFAULT_MAX_ENTRIES_PER_CALL
}

fn default_max_pages_per_poll() -> u32 {
    DEFAULT_MAX_PAGES_PER_POLL
}

impl CaptureConfig {
    /// A configuration for `journal` with every other setting defaulted.
    pub fn new(journal: JournalId) -> Self {
        Self {
            journal,
            include: Vec::new(),
            ccsid: Ccsid::default(),
            max_entries_per_call: DEFAULT_MAX_ENTRIES_PER_CALL,
            max_pages_per_poll: DEFAULT_MAX_PAGES_PER_POLL,
            dump_folder: None,
            watchdog_timeout_secs: None,
            checkpoint_path: None,
            sync_checkpoint: false,
            host: None,
        }
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`CaptureConfig::validate`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks object names and limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        JournalId::parse(self.journal.name.to_string(), self.journal.library.to_string()).map_err(
            |e| ConfigError::Invalid {
                field: "journal",
                reason: e.to_string(),
            },
        )?;
        for filter in &self.include {
            for part in [&filter.library, &filter.file] {
                if part != WILDCARD {
                    ObjectName::parse(part.as_str()).map_err(|e| ConfigError::Invalid {
                        field: "include",
                        reason: e.to_string(),
                    })?;
                }
            }
        }
        if self.max_entries_per_call == 0 {
            return Err(ConfigError::Invalid {
                field: "max_entries_per_call",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_pages_per_poll == 0 {
            return Err(ConfigError::Invalid {
                field: "max_pages_per_poll",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.watchdog_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "watchdog_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Engine options derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            ccsid: self.ccsid,
            max_entries_per_call: self.max_entries_per_call,
            max_pages_per_poll: self.max_pages_per_poll,
            dump_folder: self.dump_folder.clone(),
        }
    }

    /// The include list as a filter.
    pub fn include_filter(&self) -> IncludeFilter {
        IncludeFilter::new(self.include.clone())
    }

    /// Watchdog timeout, if one is configured.
    pub fn watchdog_timeout(&self) -> Option<Duration> {
        self.watchdog_timeout_secs.map(Duration::from_secs)
    }

    /// Checkpoint file, if a path is configured.
    pub fn checkpoint_file(&self) -> Option<CheckpointFile> {
        self.checkpoint_path
            .as_ref()
            .map(|path| CheckpointFile::new(path.clone()).with_sync(self.sync_checkpoint))
    }
}
