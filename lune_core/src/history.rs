//! Ordered period history.
//!
//! Records are kept sorted by start date, newest first. Every constructor
//! (including deserialization) re-sorts, so callers can rely on the order
//! regardless of how the records were written.

use crate::PeriodRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-disk shape of a history snapshot
#[derive(Deserialize)]
struct RawHistory {
    #[serde(default)]
    records: Vec<PeriodRecord>,
}

impl From<RawHistory> for PeriodHistory {
    fn from(raw: RawHistory) -> Self {
        PeriodHistory::from_records(raw.records)
    }
}

/// Period records sorted by start date descending
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawHistory")]
pub struct PeriodHistory {
    records: Vec<PeriodRecord>,
}

impl PeriodHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(mut records: Vec<PeriodRecord>) -> Self {
        sort_newest_first(&mut records);
        Self { records }
    }

    pub fn records(&self) -> &[PeriodRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PeriodRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent record, active or completed
    pub fn latest(&self) -> Option<&PeriodRecord> {
        self.records.first()
    }

    /// Most recent record with an end date; the prediction anchor
    pub fn latest_completed(&self) -> Option<&PeriodRecord> {
        self.records.iter().find(|r| r.is_completed())
    }

    /// Most recent record without an end date
    pub fn active(&self) -> Option<&PeriodRecord> {
        self.records.iter().find(|r| r.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_active()).count()
    }

    pub fn get(&self, id: Uuid) -> Option<&PeriodRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Mutable access to a record; start dates must not be changed through it
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut PeriodRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Insert a record, keeping the newest-first order
    pub fn insert(&mut self, record: PeriodRecord) {
        self.records.push(record);
        sort_newest_first(&mut self.records);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<PeriodRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    /// Keep only the records for which `keep` returns true
    ///
    /// Returns the number of records removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&PeriodRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(keep);
        before - self.records.len()
    }
}

fn sort_newest_first(records: &mut [PeriodRecord]) {
    records.sort_by(|a, b| b.start_date.cmp(&a.start_date));
}
