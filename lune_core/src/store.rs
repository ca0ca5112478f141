//! Period history persistence with file locking.
//!
//! The whole history is one JSON snapshot. Readers take a shared lock;
//! writers build the new snapshot in a temp file next to the target and
//! rename it into place.

use crate::{Error, PeriodHistory, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the snapshot inside the data directory
pub const RECORDS_FILE: &str = "records.json";

/// Snapshot store for the period history
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard location inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(RECORDS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history with shared locking
    ///
    /// Returns an empty history if the file doesn't exist.
    /// If the file is unreadable or corrupted, logs a warning and returns an
    /// empty history.
    pub fn load(&self) -> Result<PeriodHistory> {
        let path = self.path.as_path();
        if !path.exists() {
            tracing::info!("No record file at {:?}, starting empty", path);
            return Ok(PeriodHistory::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open record file {:?}: {}. Starting empty.", path, e);
                return Ok(PeriodHistory::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock record file {:?}: {}. Starting empty.", path, e);
            return Ok(PeriodHistory::default());
        }

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;

        if let Err(e) = read {
            tracing::warn!("Failed to read record file {:?}: {}. Starting empty.", path, e);
            return Ok(PeriodHistory::default());
        }

        match serde_json::from_str::<PeriodHistory>(&contents) {
            Ok(history) => {
                tracing::debug!("Loaded {} records from {:?}", history.len(), path);
                Ok(history)
            }
            Err(e) => {
                tracing::warn!("Failed to parse record file {:?}: {}. Starting empty.", path, e);
                Ok(PeriodHistory::default())
            }
        }
    }

    /// Save the history atomically
    ///
    /// 1. Write to a temp file in the same directory (exclusively locked)
    /// 2. Sync to disk
    /// 3. Rename over the original
    pub fn save(&self, history: &PeriodHistory) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Error::Store(format!("record path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(history)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} records to {:?}", history.len(), self.path);
        Ok(())
    }

    /// Load the history, modify it, and save it back
    pub fn update<F, T>(&self, f: F) -> Result<(PeriodHistory, T)>
    where
        F: FnOnce(&mut PeriodHistory) -> Result<T>,
    {
        let mut history = self.load()?;
        let value = f(&mut history)?;
        self.save(&history)?;
        Ok((history, value))
    }
}
