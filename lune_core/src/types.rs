//! Core domain types for Lune.
//!
//! This module defines the fundamental types used throughout the system:
//! - Period records and the calendar-day helpers they rely on
//! - Day classification and phase labels
//! - The "today" summary consumed by front ends
//! - Sleep/diary journal entries

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Calendar constants
// ============================================================================

pub const DEFAULT_CYCLE_LENGTH: i32 = 28;
pub const DEFAULT_PERIOD_LENGTH: i32 = 5;

pub const MIN_CYCLE_LENGTH: i32 = 15;
pub const MAX_CYCLE_LENGTH: i32 = 60;
pub const MIN_PERIOD_LENGTH: i32 = 1;
pub const MAX_PERIOD_LENGTH: i32 = 15;

/// A start within this many days of the last completed start re-opens it
pub const RESTART_WINDOW_DAYS: i64 = 3;

/// Signed number of calendar days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn clamp_cycle_length(days: i64) -> i32 {
    days.clamp(MIN_CYCLE_LENGTH as i64, MAX_CYCLE_LENGTH as i64) as i32
}

pub fn clamp_period_length(days: i64) -> i32 {
    days.clamp(MIN_PERIOD_LENGTH as i64, MAX_PERIOD_LENGTH as i64) as i32
}

pub(crate) fn default_cycle_length() -> i32 {
    DEFAULT_CYCLE_LENGTH
}

pub(crate) fn default_period_length() -> i32 {
    DEFAULT_PERIOD_LENGTH
}

// ============================================================================
// Period records
// ============================================================================

/// One period episode
///
/// A record without `end_date` is active (ongoing). Lengths are stored as
/// signed day counts; records read from disk may carry degenerate values and
/// every consumer tolerates them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodRecord {
    pub id: Uuid,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_cycle_length")]
    pub cycle_length: i32,
    #[serde(default = "default_period_length")]
    pub period_length: i32,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PeriodRecord {
    pub fn new(start_date: NaiveDate, cycle_length: i32, period_length: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date: None,
            cycle_length,
            period_length,
            symptoms: None,
            mood: None,
            notes: None,
        }
    }

    /// Builder-style helper for a record that already ended
    pub fn completed(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.end_date.is_some()
    }

    /// Last day occupied by this episode
    ///
    /// The recorded end date when present, otherwise the day the period is
    /// expected to finish given its period length.
    pub fn last_day(&self) -> NaiveDate {
        match self.end_date {
            Some(end) => end,
            None => {
                let span = Duration::days(self.period_length as i64 - 1);
                self.start_date
                    .checked_add_signed(span)
                    .unwrap_or(if self.period_length > 0 {
                        NaiveDate::MAX
                    } else {
                        NaiveDate::MIN
                    })
            }
        }
    }

    /// Whether `date` falls inside the occupied day range (inclusive)
    pub fn covers(&self, date: NaiveDate) -> bool {
        let offset = days_between(self.start_date, date);
        if offset < 0 {
            return false;
        }
        match self.end_date {
            Some(end) => date <= end,
            None => offset < self.period_length as i64,
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Calendar marker for a single day
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Inside a recorded (or ongoing) period
    Period,
    /// Inside a period projected from the anchor record
    PredictedPeriod,
    Ovulation,
    Fertile,
    #[default]
    None,
}

impl DayStatus {
    /// Single-character marker for compact calendar views
    pub fn marker(self) -> char {
        match self {
            DayStatus::Period => '●',
            DayStatus::PredictedPeriod => '○',
            DayStatus::Ovulation => '◆',
            DayStatus::Fertile => '◇',
            DayStatus::None => '·',
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayStatus::Period => "period",
            DayStatus::PredictedPeriod => "predicted period",
            DayStatus::Ovulation => "ovulation",
            DayStatus::Fertile => "fertile",
            DayStatus::None => "none",
        };
        f.write_str(label)
    }
}

/// Phase label for the "today" view
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// No record has ever been logged
    NoRecords,
    /// The latest record starts in the future
    Waiting,
    /// Day `day` (1-based) of the current period
    Period { day: i64 },
    Safe,
    Ovulation,
    Luteal,
    /// The last few days before the next expected period
    Approaching,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NoRecords => f.write_str("waiting for first record"),
            Phase::Waiting => f.write_str("waiting"),
            Phase::Period { day } => write!(f, "period day {}", day),
            Phase::Safe => f.write_str("safe"),
            Phase::Ovulation => f.write_str("ovulation"),
            Phase::Luteal => f.write_str("luteal"),
            Phase::Approaching => f.write_str("period approaching"),
        }
    }
}

/// Summary state derived from the most recent record
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Summary {
    pub phase: Phase,
    /// Days since the latest record started (negative if it starts later)
    pub days_since_start: Option<i64>,
    /// 1-based day within the current cycle, 0 when unknown
    pub cycle_day: i64,
    pub is_in_period: bool,
    pub days_until_next_period: Option<i64>,
    pub days_until_ovulation: Option<i64>,
    /// Fraction of the cycle elapsed, in `[0, 1)`
    pub cycle_progress: f64,
    /// Fraction of the period elapsed while in period, otherwise 0
    pub period_progress: f64,
}

impl Summary {
    /// Summary shown before any record exists
    pub fn empty() -> Self {
        Self {
            phase: Phase::NoRecords,
            days_since_start: None,
            cycle_day: 0,
            is_in_period: false,
            days_until_next_period: None,
            days_until_ovulation: None,
            cycle_progress: 0.0,
            period_progress: 0.0,
        }
    }
}

/// Upcoming predicted dates, relative to the day the forecast was made for
///
/// The period and the fertile window are each the first one that has not
/// finished yet, so they may belong to different cycles.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Forecast {
    pub next_period_start: NaiveDate,
    pub next_period_end: NaiveDate,
    pub ovulation: NaiveDate,
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
}

// ============================================================================
// Journal
// ============================================================================

/// What a journal entry records
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalKind {
    Diary {
        text: String,
        #[serde(default)]
        mood: Option<String>,
    },
    Sleep {
        hours: f32,
        /// Subjective quality from 1 (poor) to 5 (great)
        #[serde(default)]
        quality: Option<u8>,
    },
}

/// A sleep or diary entry for one calendar day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub kind: JournalKind,
}

impl JournalEntry {
    pub fn new(date: NaiveDate, kind: JournalKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            recorded_at: Utc::now(),
            kind,
        }
    }
}
