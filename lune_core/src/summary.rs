//! "Today" summary derived from the most recent record.
//!
//! Independent of the predictor: the summary only looks at the latest
//! record (active or completed) and wraps its cycle forward from the start
//! date.

use crate::types::{days_between, Phase, Summary, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH};
use crate::PeriodRecord;
use chrono::NaiveDate;

/// Summarize the cycle state on `today`
///
/// Phase selection, first match wins:
/// - record starts after today → `Waiting`
/// - today inside the record's day range → `Period { day }`
/// - otherwise the day within the cycle is bucketed around the cycle
///   midpoint: `Safe` before `mid - 2`, `Ovulation` up to `mid + 2`,
///   `Luteal` until three days before the cycle ends, then `Approaching`.
pub fn summarize(latest: Option<&PeriodRecord>, today: NaiveDate) -> Summary {
    let Some(record) = latest else {
        return Summary::empty();
    };

    let cycle_length = positive_or(record.cycle_length, DEFAULT_CYCLE_LENGTH);
    let period_length = positive_or(record.period_length, DEFAULT_PERIOD_LENGTH);
    let days_since_start = days_between(record.start_date, today);

    if days_since_start < 0 {
        return Summary {
            phase: Phase::Waiting,
            days_since_start: Some(days_since_start),
            days_until_next_period: Some(-days_since_start),
            ..Summary::empty()
        };
    }

    // Completed records count too when today lies inside their range
    let is_in_period = match record.end_date {
        Some(end) => today <= end,
        None => days_since_start < period_length,
    };

    let effective_day = days_since_start % cycle_length;
    let mid = cycle_length / 2;

    let phase = if is_in_period {
        Phase::Period {
            day: days_since_start + 1,
        }
    } else if effective_day < mid - 2 {
        Phase::Safe
    } else if effective_day <= mid + 2 {
        Phase::Ovulation
    } else if effective_day < cycle_length - 3 {
        Phase::Luteal
    } else {
        Phase::Approaching
    };

    let days_until_ovulation = if effective_day <= mid {
        mid - effective_day
    } else {
        cycle_length - effective_day + mid
    };

    let period_progress = if is_in_period {
        ((days_since_start + 1) as f64 / period_length as f64).min(1.0)
    } else {
        0.0
    };

    Summary {
        phase,
        days_since_start: Some(days_since_start),
        cycle_day: effective_day + 1,
        is_in_period,
        days_until_next_period: Some(cycle_length - effective_day),
        days_until_ovulation: Some(days_until_ovulation),
        cycle_progress: effective_day as f64 / cycle_length as f64,
        period_progress,
    }
}

fn positive_or(value: i32, fallback: i32) -> i64 {
    if value > 0 {
        value as i64
    } else {
        fallback as i64
    }
}
