//! Sleep and diary journal.
//!
//! Entries are appended to a JSONL (JSON Lines) file with file locking so
//! the CLI and other tools can write to it at the same time.

use crate::{JournalEntry, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// File name of the journal inside the data directory
pub const JOURNAL_FILE: &str = "journal.jsonl";

/// Destination for journal entries
pub trait JournalSink {
    fn append(&mut self, entry: &JournalEntry) -> Result<()>;
}

/// JSONL-backed journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(JOURNAL_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl JournalSink for JsonlJournal {
    fn append(&mut self, entry: &JournalEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        // Terminate a line left unfinished by an interrupted write
        let repair = ends_without_newline(&mut file)?;

        let mut writer = std::io::BufWriter::new(&file);
        if repair {
            tracing::warn!("Journal {:?} ended mid-line, starting a new line", self.path);
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended journal entry {} for {}", entry.id, entry.date);
        Ok(())
    }
}

fn ends_without_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read all entries from a journal file
///
/// Malformed lines (e.g. a partial write) are skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Skipping journal line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} journal entries", entries.len());
    Ok(entries)
}

/// Entries dated within `[from, to]`, newest first
pub fn entries_between(entries: &[JournalEntry], from: NaiveDate, to: NaiveDate) -> Vec<JournalEntry> {
    let mut selected: Vec<JournalEntry> = entries
        .iter()
        .filter(|e| from <= e.date && e.date <= to)
        .cloned()
        .collect();
    selected.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.recorded_at.cmp(&a.recorded_at))
    });
    selected
}
