//! Cycle prediction over the period history.
//!
//! Classification rules:
//! 1. A day inside any record's occupied range is a recorded period.
//! 2. Nothing is predicted until at least one record has an end date.
//! 3. The most recent completed record (the anchor) is projected forward in
//!    steps of its cycle length. The anchor's own cycle only gets fertile and
//!    ovulation markers; later cycles also get a predicted period.

use crate::types::{days_between, DayStatus, Forecast};
use crate::{Error, PeriodRecord, Result};
use chrono::{Datelike, Duration, NaiveDate};

/// Day offsets (from a cycle start) of the markers inside one cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleWindow {
    pub cycle_length: i64,
    pub period_length: i64,
    pub ovulation_day: i64,
    pub fertile_start: i64,
    pub fertile_end: i64,
}

impl CycleWindow {
    /// Window for a record's lengths, or None when either length is not positive
    ///
    /// Ovulation is placed 14 days before the next cycle but never inside
    /// the period; the fertile window is clamped to stay after the period
    /// and before the cycle ends.
    pub fn for_record(record: &PeriodRecord) -> Option<Self> {
        let cycle_length = record.cycle_length as i64;
        let period_length = record.period_length as i64;
        if cycle_length <= 0 || period_length <= 0 {
            return None;
        }

        let ovulation_day = (cycle_length - 14).max(period_length + 1);
        let fertile_start = (ovulation_day - 5).max(period_length);
        let fertile_end = (ovulation_day + 1).min(cycle_length - 1);

        Some(Self {
            cycle_length,
            period_length,
            ovulation_day,
            fertile_start,
            fertile_end,
        })
    }

    /// Fertility marker for a 0-based day within the cycle
    fn fertility_status(&self, day_in_cycle: i64) -> DayStatus {
        if day_in_cycle == self.ovulation_day {
            DayStatus::Ovulation
        } else if (self.fertile_start..=self.fertile_end).contains(&day_in_cycle) {
            DayStatus::Fertile
        } else {
            DayStatus::None
        }
    }
}

/// Most recent completed record by start date
fn anchor(records: &[PeriodRecord]) -> Option<&PeriodRecord> {
    records
        .iter()
        .filter(|r| r.is_completed())
        .max_by_key(|r| r.start_date)
}

/// Classify a single calendar day
///
/// Never fails: degenerate lengths, an empty history or a date before the
/// anchor all yield `DayStatus::None`.
pub fn classify(records: &[PeriodRecord], date: NaiveDate) -> DayStatus {
    if records.iter().any(|r| r.covers(date)) {
        return DayStatus::Period;
    }

    let Some(anchor) = anchor(records) else {
        return DayStatus::None;
    };

    let diff = days_between(anchor.start_date, date);
    if diff < 0 {
        return DayStatus::None;
    }

    let Some(window) = CycleWindow::for_record(anchor) else {
        return DayStatus::None;
    };

    let day_in_cycle = diff.rem_euclid(window.cycle_length);

    // The anchor's own period days were already matched above
    if diff >= window.cycle_length && day_in_cycle < window.period_length {
        return DayStatus::PredictedPeriod;
    }

    window.fertility_status(day_in_cycle)
}

/// Upcoming predicted period and fertile window as seen from `from`
///
/// Returns None whenever `classify` could not predict anything (no completed
/// record or degenerate lengths). A period or window that contains `from` is
/// still considered upcoming.
pub fn forecast(records: &[PeriodRecord], from: NaiveDate) -> Option<Forecast> {
    let anchor = anchor(records)?;
    let window = CycleWindow::for_record(anchor)?;

    let diff = days_between(anchor.start_date, from);
    let (cycle_idx, day_in_cycle) = if diff < 0 {
        (0, -1)
    } else {
        (diff / window.cycle_length, diff % window.cycle_length)
    };

    // Predicted periods start at cycle 1; cycle 0 is the anchor itself
    let period_cycle = if day_in_cycle >= 0 && day_in_cycle < window.period_length {
        cycle_idx.max(1)
    } else {
        (cycle_idx + 1).max(1)
    };

    let fertile_cycle = if day_in_cycle > window.fertile_end {
        cycle_idx + 1
    } else {
        cycle_idx
    };

    let cycle_start = |idx: i64| offset(anchor.start_date, idx * window.cycle_length);
    let period_start = cycle_start(period_cycle)?;
    let fertile_base = cycle_start(fertile_cycle)?;

    Some(Forecast {
        next_period_start: period_start,
        next_period_end: offset(period_start, window.period_length - 1)?,
        ovulation: offset(fertile_base, window.ovulation_day)?,
        fertile_start: offset(fertile_base, window.fertile_start)?,
        fertile_end: offset(fertile_base, window.fertile_end)?,
    })
}

/// Status of every day in a calendar month
pub fn month_calendar(
    records: &[PeriodRecord],
    year: i32,
    month: u32,
) -> Result<Vec<(NaiveDate, DayStatus)>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Parse(format!("Invalid month: {}-{:02}", year, month)))?;

    let days = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|d| (d, classify(records, d)))
        .collect();

    Ok(days)
}

fn offset(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day0() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn day(n: i64) -> NaiveDate {
        day0() + Duration::days(n)
    }

    /// Single completed anchor: cycle 28, period 5, days 0..=4
    fn anchor_only() -> Vec<PeriodRecord> {
        vec![PeriodRecord::new(day(0), 28, 5).completed(day(4))]
    }

    #[test]
    fn test_recorded_period_days() {
        crate::logging::init_test();
        let records = anchor_only();
        for n in 0..=4 {
            assert_eq!(classify(&records, day(n)), DayStatus::Period, "day {}", n);
        }
        assert_ne!(classify(&records, day(5)), DayStatus::Period);
    }

    #[test]
    fn test_active_record_uses_period_length() {
        let records = vec![PeriodRecord::new(day(0), 28, 3)];
        assert_eq!(classify(&records, day(0)), DayStatus::Period);
        assert_eq!(classify(&records, day(2)), DayStatus::Period);
        assert_eq!(classify(&records, day(3)), DayStatus::None);
    }

    #[test]
    fn test_no_prediction_without_completed_record() {
        let records = vec![PeriodRecord::new(day(0), 28, 5)];
        for n in 5..120 {
            assert_eq!(classify(&records, day(n)), DayStatus::None, "day {}", n);
        }
        assert_eq!(classify(&[], day(0)), DayStatus::None);
    }

    #[test]
    fn test_worked_examples() {
        let records = anchor_only();
        // ovulation 14, fertile 9..=15
        assert_eq!(classify(&records, day(35)), DayStatus::None);
        assert_eq!(classify(&records, day(28)), DayStatus::PredictedPeriod);
        assert_eq!(classify(&records, day(42)), DayStatus::Ovulation);
    }

    #[test]
    fn test_first_cycle_has_no_predicted_period() {
        let records = anchor_only();
        assert_eq!(classify(&records, day(8)), DayStatus::None);
        assert_eq!(classify(&records, day(9)), DayStatus::Fertile);
        assert_eq!(classify(&records, day(14)), DayStatus::Ovulation);
        assert_eq!(classify(&records, day(15)), DayStatus::Fertile);
        assert_eq!(classify(&records, day(16)), DayStatus::None);
        assert_eq!(classify(&records, day(27)), DayStatus::None);
    }

    #[test]
    fn test_subsequent_cycles_repeat() {
        let records = anchor_only();
        for n in 28..=32 {
            assert_eq!(classify(&records, day(n)), DayStatus::PredictedPeriod);
        }
        assert_eq!(classify(&records, day(33)), DayStatus::None);
        assert_eq!(classify(&records, day(56)), DayStatus::PredictedPeriod);
        assert_eq!(classify(&records, day(56 + 14)), DayStatus::Ovulation);
    }

    #[test]
    fn test_query_before_anchor_is_none() {
        let records = anchor_only();
        assert_eq!(classify(&records, day(-1)), DayStatus::None);
        assert_eq!(classify(&records, day(-30)), DayStatus::None);
    }

    #[test]
    fn test_degenerate_lengths_never_predict() {
        let mut record = PeriodRecord::new(day(0), 0, 5).completed(day(4));
        assert_eq!(classify(&[record.clone()], day(30)), DayStatus::None);

        record.cycle_length = 28;
        record.period_length = -2;
        assert_eq!(classify(&[record.clone()], day(28)), DayStatus::None);
        // The recorded range still counts
        assert_eq!(classify(&[record], day(2)), DayStatus::Period);
    }

    #[test]
    fn test_anchor_is_latest_completed_not_latest_overall() {
        let records = vec![
            PeriodRecord::new(day(30), 28, 5),
            PeriodRecord::new(day(0), 28, 5).completed(day(4)),
        ];
        // Active record's own days
        assert_eq!(classify(&records, day(31)), DayStatus::Period);
        // Anchor (day 0) projects onto day 56
        assert_eq!(classify(&records, day(56)), DayStatus::PredictedPeriod);
    }

    #[test]
    fn test_short_cycle_windows_are_clamped() {
        let record = PeriodRecord::new(day(0), 15, 7).completed(day(6));
        let window = CycleWindow::for_record(&record).unwrap();
        // 15 - 14 = 1 is inside the period, so ovulation moves to day 8
        assert_eq!(window.ovulation_day, 8);
        assert_eq!(window.fertile_start, 7);
        assert_eq!(window.fertile_end, 9);
        assert_eq!(classify(&[record], day(8)), DayStatus::Ovulation);
    }

    #[test]
    fn test_forecast_from_first_cycle() {
        let records = anchor_only();
        let f = forecast(&records, day(10)).unwrap();
        assert_eq!(f.next_period_start, day(28));
        assert_eq!(f.next_period_end, day(32));
        assert_eq!(f.ovulation, day(14));
        assert_eq!(f.fertile_start, day(9));
        assert_eq!(f.fertile_end, day(15));
    }

    #[test]
    fn test_forecast_rolls_over_finished_windows() {
        let records = anchor_only();
        let f = forecast(&records, day(20)).unwrap();
        assert_eq!(f.next_period_start, day(28));
        assert_eq!(f.ovulation, day(42));

        // Inside a predicted period it is still the upcoming one
        let f = forecast(&records, day(30)).unwrap();
        assert_eq!(f.next_period_start, day(28));

        let f = forecast(&records, day(33)).unwrap();
        assert_eq!(f.next_period_start, day(56));
    }

    #[test]
    fn test_forecast_none_without_anchor() {
        let records = vec![PeriodRecord::new(day(0), 28, 5)];
        assert!(forecast(&records, day(3)).is_none());
    }

    #[test]
    fn test_month_calendar() {
        let records = anchor_only();
        let days = month_calendar(&records, 2024, 2).unwrap();
        assert_eq!(days.len(), 29); // leap year
        // 2024-01-29 is day 28 → predicted period through Feb 2
        assert_eq!(days[0].1, DayStatus::PredictedPeriod);
        assert_eq!(days[1].1, DayStatus::PredictedPeriod);
        assert_eq!(days[2].1, DayStatus::None);

        assert!(month_calendar(&records, 2024, 13).is_err());
    }
}
