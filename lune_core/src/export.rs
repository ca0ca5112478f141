//! CSV export and import of the period history.
//!
//! The CSV is meant for spreadsheets and backups: one row per record,
//! dates as `YYYY-MM-DD`, empty cells for missing optional fields.

use crate::types::{DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH};
use crate::{Error, PeriodHistory, PeriodRecord, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row in the CSV file
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    start_date: String,
    end_date: Option<String>,
    cycle_length: Option<i32>,
    period_length: Option<i32>,
    symptoms: Option<String>,
    mood: Option<String>,
    notes: Option<String>,
}

impl From<&PeriodRecord> for CsvRow {
    fn from(record: &PeriodRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            start_date: record.start_date.format(DATE_FORMAT).to_string(),
            end_date: record.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
            cycle_length: Some(record.cycle_length),
            period_length: Some(record.period_length),
            symptoms: record.symptoms.clone(),
            mood: record.mood.clone(),
            notes: record.notes.clone(),
        }
    }
}

impl TryFrom<CsvRow> for PeriodRecord {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Parse(format!("Invalid UUID {:?}: {}", row.id, e)))?;

        let start_date = parse_date(&row.start_date)?;
        let end_date = row
            .end_date
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_date)
            .transpose()?;

        if let Some(end) = end_date {
            if end < start_date {
                return Err(Error::Parse(format!(
                    "Record {} ends ({}) before it starts ({})",
                    id, end, start_date
                )));
            }
        }

        Ok(PeriodRecord {
            id,
            start_date,
            end_date,
            cycle_length: row.cycle_length.unwrap_or(DEFAULT_CYCLE_LENGTH),
            period_length: row.period_length.unwrap_or(DEFAULT_PERIOD_LENGTH),
            symptoms: non_empty(row.symptoms),
            mood: non_empty(row.mood),
            notes: non_empty(row.notes),
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("Invalid date {:?}: {}", s, e)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Write the whole history to `path`, replacing any existing file
///
/// Rows are written oldest first and the file is synced before returning.
/// Returns the number of rows written.
pub fn export_csv(history: &PeriodHistory, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);

    for record in history.records().iter().rev() {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} records to {:?}", history.len(), path);
    Ok(history.len())
}

/// Read records from a CSV file written by `export_csv`
///
/// Rows that fail to parse are skipped with a warning.
pub fn import_csv(path: &Path) -> Result<Vec<PeriodRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for (idx, result) in reader.deserialize::<CsvRow>().enumerate() {
        match result {
            Ok(row) => match PeriodRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping CSV row {}: {}", idx + 1, e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV row {}: {}", idx + 1, e),
        }
    }

    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Add imported records whose id is not already in the history
///
/// Returns the number of records added.
pub fn merge_imported(history: &mut PeriodHistory, records: Vec<PeriodRecord>) -> usize {
    let mut added = 0;
    for record in records {
        if history.contains(record.id) {
            tracing::debug!("Record {} already present, skipping", record.id);
            continue;
        }
        history.insert(record);
        added += 1;
    }
    if history.active_count() > 1 {
        tracing::warn!(
            "History now has {} active records; the next end will keep only the latest",
            history.active_count()
        );
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn sample() -> PeriodHistory {
        let mut first = PeriodRecord::new(day(1, 2), 28, 5).completed(day(1, 6));
        first.mood = Some("tired".into());
        first.notes = Some("started at night, heavy".into());
        PeriodHistory::from_records(vec![first, PeriodRecord::new(day(1, 30), 28, 5)])
    }

    #[test]
    fn test_export_then_import_preserves_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("history.csv");
        let history = sample();

        let written = export_csv(&history, &path).unwrap();
        assert_eq!(written, 2);

        let imported = PeriodHistory::from_records(import_csv(&path).unwrap());
        assert_eq!(imported, history);
    }

    #[test]
    fn test_export_has_header_and_oldest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.csv");
        export_csv(&sample(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("id,start_date,end_date"));
        assert!(lines.next().unwrap().contains("2024-01-02"));
        assert!(lines.next().unwrap().contains("2024-01-30"));
    }

    #[test]
    fn test_import_skips_bad_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.csv");
        std::fs::write(
            &path,
            "id,start_date,end_date,cycle_length,period_length,symptoms,mood,notes\n\
             00000000-0000-0000-0000-000000000001,2024-03-01,2024-03-05,30,5,,,\n\
             not-a-uuid,2024-04-01,,,,,,\n\
             00000000-0000-0000-0000-000000000002,2024-05-10,2024-05-01,,,,,\n\
             00000000-0000-0000-0000-000000000003,2024-06-01,,,,,,\n",
        )
        .unwrap();

        let records = import_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cycle_length, 30);
        assert_eq!(records[1].cycle_length, 28);
        assert!(records[1].is_active());
        assert!(records[1].notes.is_none());
    }

    #[test]
    fn test_merge_skips_existing_ids() {
        let mut history = sample();
        let existing = history.records().to_vec();
        let new_record = PeriodRecord::new(day(2, 27), 28, 5).completed(day(3, 2));

        let mut incoming = existing;
        incoming.push(new_record.clone());

        let added = merge_imported(&mut history, incoming);
        assert_eq!(added, 1);
        assert_eq!(history.len(), 3);
        assert!(history.contains(new_record.id));
    }
}
