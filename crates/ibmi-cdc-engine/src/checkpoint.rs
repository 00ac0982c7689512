//! Checkpoint persistence.

use crate::error::CheckpointError;
use ibmi_cdc_model::JournalProcessedPosition;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A checkpoint stored as JSON on disk.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the
/// checkpoint, so a crash leaves either the old or the new checkpoint.
///
/// # Example
///
/// ```rust,no_run
/// use ibmi_cdc_engine::CheckpointFile;
///
/// let file = CheckpointFile::new("orders.checkpoint.json").with_sync(true);
/// let checkpoint = file.load_or_start()?;
/// println!("resuming at {}", checkpoint);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct CheckpointFile {
    path: PathBuf,
    sync: bool,
}

impl CheckpointFile {
    /// Refers to the checkpoint at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync: false,
        }
    }

    /// Whether to fsync after every write.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Path of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the checkpoint; `None` when the file does not exist.
    pub fn load(&self) -> Result<Option<JournalProcessedPosition>, CheckpointError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Reads the checkpoint, or the start of the journal when none exists.
    pub fn load_or_start(&self) -> Result<JournalProcessedPosition, CheckpointError> {
        Ok(self
            .load()?
            .unwrap_or_else(JournalProcessedPosition::start_of_journal))
    }

    /// Replaces the stored checkpoint.
    pub fn store(&self, checkpoint: &JournalProcessedPosition) -> Result<(), CheckpointError> {
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.flush()?;
            if self.sync {
                file.sync_all()?;
            }
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Resets the stored checkpoint to the start of the journal.
    pub fn reset(&self) -> Result<(), CheckpointError> {
        self.store(&JournalProcessedPosition::start_of_journal())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
