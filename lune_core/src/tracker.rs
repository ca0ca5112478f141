//! Tracker service.
//!
//! `Tracker` is the single writer for a data directory: it owns the record
//! store, the cycle settings and the list of subscribers. Mutations take
//! `&mut self`, are persisted before returning, and every subscriber then
//! receives the new history snapshot. Consumers turn a snapshot into what
//! they display with [`recompute`].

use crate::config::{Config, CycleConfig};
use crate::episode::{self, Outcome};
use crate::export;
use crate::journal::{self, JournalSink, JsonlJournal};
use crate::predictor::{classify, forecast};
use crate::store::RecordStore;
use crate::summary::summarize;
use crate::types::{DayStatus, Forecast, JournalEntry, Summary};
use crate::{PeriodHistory, Result};
use chrono::{Days, NaiveDate};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Everything a front end shows for one day
#[derive(Clone, Debug, PartialEq)]
pub struct CycleView {
    pub today: NaiveDate,
    pub status: DayStatus,
    pub summary: Summary,
    pub forecast: Option<Forecast>,
}

/// Derive the view for `today` from a history snapshot
pub fn recompute(history: &PeriodHistory, today: NaiveDate) -> CycleView {
    let records = history.records();
    CycleView {
        today,
        status: classify(records, today),
        summary: summarize(history.latest(), today),
        forecast: forecast(records, today),
    }
}

pub struct Tracker {
    store: RecordStore,
    journal: JsonlJournal,
    settings: CycleConfig,
    history: PeriodHistory,
    subscribers: Vec<Sender<PeriodHistory>>,
}

impl Tracker {
    /// Open the tracker for `data_dir`, loading the stored history
    pub fn open(data_dir: &Path, config: &Config) -> Result<Self> {
        let store = RecordStore::in_dir(data_dir);
        let history = store.load()?;
        tracing::debug!(
            "Opened tracker at {:?} with {} records",
            data_dir,
            history.len()
        );

        Ok(Self {
            store,
            journal: JsonlJournal::in_dir(data_dir),
            settings: config.cycle.clone(),
            history,
            subscribers: Vec::new(),
        })
    }

    pub fn history(&self) -> &PeriodHistory {
        &self.history
    }

    pub fn settings(&self) -> &CycleConfig {
        &self.settings
    }

    /// Receive a snapshot now and after every change
    pub fn subscribe(&mut self) -> Receiver<PeriodHistory> {
        let (tx, rx) = channel();
        // A fresh receiver cannot be disconnected yet
        let _ = tx.send(self.history.clone());
        self.subscribers.push(tx);
        rx
    }

    pub fn view(&self, today: NaiveDate) -> CycleView {
        recompute(&self.history, today)
    }

    pub fn start_period(&mut self, date: NaiveDate) -> Result<Outcome> {
        let settings = self.settings.clone();
        self.apply(|history| episode::start_period(history, &settings, date))
    }

    pub fn end_period(&mut self, date: NaiveDate) -> Result<Outcome> {
        self.apply(|history| episode::end_period(history, date))
    }

    pub fn reset(&mut self) -> Result<Outcome> {
        self.apply(episode::reset)
    }

    /// Merge records from a CSV export, returning how many were added
    pub fn import_csv(&mut self, path: &Path) -> Result<usize> {
        let records = export::import_csv(path)?;
        let mut next = self.history.clone();
        let added = export::merge_imported(&mut next, records);
        if added > 0 {
            self.commit(next)?;
        }
        Ok(added)
    }

    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        export::export_csv(&self.history, path)
    }

    pub fn add_journal_entry(&mut self, entry: &JournalEntry) -> Result<()> {
        self.journal.append(entry)
    }

    /// Journal entries from the last `days` days up to `today`, newest first
    ///
    /// A window reaching past the earliest representable date covers everything
    /// up to `today`.
    pub fn journal_entries(&self, today: NaiveDate, days: u32) -> Result<Vec<JournalEntry>> {
        let entries = journal::read_entries(self.journal.path())?;
        let from = today
            .checked_sub_days(Days::new(u64::from(days.max(1)) - 1))
            .unwrap_or(NaiveDate::MIN);
        Ok(journal::entries_between(&entries, from, today))
    }

    /// Apply a mutation rule to a copy of the history and commit it if it changed
    fn apply<F>(&mut self, rule: F) -> Result<Outcome>
    where
        F: FnOnce(&mut PeriodHistory) -> Outcome,
    {
        let mut next = self.history.clone();
        let outcome = rule(&mut next);
        if outcome.changed() {
            self.commit(next)?;
        }
        Ok(outcome)
    }

    /// Persist, then publish
    fn commit(&mut self, next: PeriodHistory) -> Result<()> {
        self.store.save(&next)?;
        self.history = next;
        self.notify();
        Ok(())
    }

    fn notify(&mut self) {
        let snapshot = &self.history;
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} disconnected subscribers", dropped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JournalKind, Phase};
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap() + Duration::days(n)
    }

    fn open(dir: &Path) -> Tracker {
        Tracker::open(dir, &Config::default()).unwrap()
    }

    #[test]
    fn test_mutations_are_persisted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = open(temp_dir.path());

        tracker.start_period(day(0)).unwrap();
        tracker.end_period(day(4)).unwrap();

        let reopened = open(temp_dir.path());
        assert_eq!(reopened.history(), tracker.history());
        assert_eq!(reopened.history().latest().unwrap().period_length, 5);
    }

    #[test]
    fn test_ignored_action_does_not_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = open(temp_dir.path());

        let outcome = tracker.end_period(day(0)).unwrap();
        assert!(!outcome.changed());
        assert!(!RecordStore::in_dir(temp_dir.path()).path().exists());
    }

    #[test]
    fn test_subscribers_receive_snapshots() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = open(temp_dir.path());
        let rx = tracker.subscribe();

        assert!(rx.recv().unwrap().is_empty());

        tracker.start_period(day(0)).unwrap();
        let snapshot = rx.recv().unwrap();
        assert_eq!(snapshot.len(), 1);

        // Ignored action publishes nothing
        tracker.start_period(day(1)).unwrap();
        assert!(rx.try_recv().is_err());

        tracker.reset().unwrap();
        assert!(rx.recv().unwrap().is_empty());
    }

    #[test]
    fn test_disconnected_subscribers_are_dropped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = open(temp_dir.path());
        let rx = tracker.subscribe();
        drop(rx);

        tracker.start_period(day(0)).unwrap();
        assert!(tracker.subscribers.is_empty());
    }

    #[test]
    fn test_recompute_view() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = open(temp_dir.path());
        let rx = tracker.subscribe();

        tracker.start_period(day(0)).unwrap();
        tracker.end_period(day(4)).unwrap();

        let latest = rx.try_iter().last().unwrap();
        let view = recompute(&latest, day(28));
        assert_eq!(view.status, DayStatus::PredictedPeriod);
        assert_eq!(view.summary.phase, Phase::Safe);
        assert_eq!(view.forecast.as_ref().unwrap().next_period_start, day(28));
        assert_eq!(view, tracker.view(day(28)));
    }

    #[test]
    fn test_journal_window() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = open(temp_dir.path());

        for n in [0, 5, 9] {
            tracker
                .add_journal_entry(&JournalEntry::new(
                    day(n),
                    JournalKind::Sleep {
                        hours: 8.0,
                        quality: None,
                    },
                ))
                .unwrap();
        }

        let entries = tracker.journal_entries(day(9), 7).unwrap();
        let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(9), day(5)]);
    }

    #[test]
    fn test_journal_window_larger_than_calendar() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut tracker = open(temp_dir.path());
        tracker
            .add_journal_entry(&JournalEntry::new(
                day(0),
                JournalKind::Diary {
                    text: "cramps".into(),
                    mood: None,
                },
            ))
            .unwrap();

        let entries = tracker.journal_entries(day(0), 1_000_000_000).unwrap();
        assert_eq!(entries.len(), 1);

        let entries = tracker.journal_entries(day(0), u32::MAX).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_import_merges_and_notifies() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("backup.csv");

        let mut source = open(&temp_dir.path().join("source"));
        source.start_period(day(0)).unwrap();
        source.end_period(day(3)).unwrap();
        source.export_csv(&csv_path).unwrap();

        let mut target = open(&temp_dir.path().join("target"));
        let rx = target.subscribe();
        assert_eq!(target.import_csv(&csv_path).unwrap(), 1);
        assert_eq!(target.import_csv(&csv_path).unwrap(), 0);

        assert_eq!(rx.try_iter().count(), 2); // initial + one import
        assert_eq!(target.history(), source.history());
    }
}
