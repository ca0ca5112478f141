//! Period episode mutation rules.
//!
//! An episode moves `NonExistent → Active → Completed`. The three user
//! actions (start, end, reset) are applied to an in-memory history here;
//! persisting the result is the caller's job. Rule violations are reported
//! as `Outcome::Ignored` and leave the history untouched.

use crate::config::{CycleConfig, CycleMode};
use crate::types::{
    clamp_cycle_length, clamp_period_length, days_between, RESTART_WINDOW_DAYS,
};
use crate::{PeriodHistory, PeriodRecord};
use chrono::NaiveDate;
use std::fmt;
use uuid::Uuid;

/// Why an action was a no-op
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Start requested while a period is ongoing
    AlreadyActive,
    /// End requested with no ongoing period
    NoActiveRecord,
    /// Reset requested on an empty history
    EmptyHistory,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            IgnoreReason::AlreadyActive => "a period is already in progress",
            IgnoreReason::NoActiveRecord => "no period is in progress",
            IgnoreReason::EmptyHistory => "there are no records",
        };
        f.write_str(msg)
    }
}

/// Result of applying an action to the history
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A new active record was created
    Started(Uuid),
    /// A recently completed record was re-opened instead of creating one
    Restarted(Uuid),
    /// The active record was completed
    Ended {
        id: Uuid,
        period_length: i32,
        /// Extra active records dropped while ending
        discarded: usize,
    },
    /// A record was deleted by reset
    Removed(Uuid),
    Ignored(IgnoreReason),
}

impl Outcome {
    /// Whether the history was modified
    pub fn changed(&self) -> bool {
        !matches!(self, Outcome::Ignored(_))
    }
}

/// Start a period on `date`
///
/// - Ignored while another record is active.
/// - Within 3 days of the last completed record's start, that record is
///   re-opened and its period length reset to the configured one.
/// - Otherwise a new record is created. In manual mode it takes the
///   configured lengths; in auto mode the cycle length is the gap since the
///   last completed start (15..=60) and the period length is copied from
///   that record.
pub fn start_period(history: &mut PeriodHistory, settings: &CycleConfig, date: NaiveDate) -> Outcome {
    if let Some(active) = history.active() {
        tracing::info!(
            "Ignoring start on {}: record {} started {} is still active",
            date,
            active.id,
            active.start_date
        );
        return Outcome::Ignored(IgnoreReason::AlreadyActive);
    }

    let last_completed = history
        .latest_completed()
        .map(|r| (r.id, r.start_date, r.period_length));

    if let Some((id, last_start, _)) = last_completed {
        if days_between(last_start, date).abs() <= RESTART_WINDOW_DAYS {
            if let Some(record) = history.get_mut(id) {
                record.end_date = None;
                record.period_length = settings.period_length();
                tracing::info!(
                    "Re-opened record {} (started {}) instead of starting {}",
                    id,
                    last_start,
                    date
                );
                return Outcome::Restarted(id);
            }
        }
    }

    let (cycle_length, period_length) = match (settings.mode, last_completed) {
        (CycleMode::Auto, Some((_, last_start, last_period))) => (
            clamp_cycle_length(days_between(last_start, date)),
            clamp_period_length(last_period as i64),
        ),
        _ => (settings.cycle_length(), settings.period_length()),
    };

    let record = PeriodRecord::new(date, cycle_length, period_length);
    let id = record.id;
    tracing::info!(
        "Started period {} on {} (cycle {} days, period {} days)",
        id,
        date,
        cycle_length,
        period_length
    );
    history.insert(record);
    Outcome::Started(id)
}

/// End the active period on `date`
///
/// If several records are active (which the start rule prevents, but old
/// data may contain), only the most recent survives. The end date never
/// precedes the start date and the period length becomes the number of
/// days covered, clamped to 1..=15.
pub fn end_period(history: &mut PeriodHistory, date: NaiveDate) -> Outcome {
    let active_ids: Vec<Uuid> = history
        .records()
        .iter()
        .filter(|r| r.is_active())
        .map(|r| r.id)
        .collect();

    let Some((&keep, extra)) = active_ids.split_first() else {
        tracing::info!("Ignoring end on {}: no active record", date);
        return Outcome::Ignored(IgnoreReason::NoActiveRecord);
    };

    let discarded = history.retain(|r| !extra.contains(&r.id));
    if discarded > 0 {
        tracing::warn!(
            "Found {} stale active records; keeping only {}",
            discarded,
            keep
        );
    }

    let Some(record) = history.get_mut(keep) else {
        return Outcome::Ignored(IgnoreReason::NoActiveRecord);
    };

    let end = date.max(record.start_date);
    let period_length = clamp_period_length(days_between(record.start_date, end) + 1);
    record.end_date = Some(end);
    record.period_length = period_length;

    tracing::info!(
        "Ended period {} on {} ({} days)",
        keep,
        end,
        period_length
    );

    Outcome::Ended {
        id: keep,
        period_length,
        discarded,
    }
}

/// Undo the latest episode
///
/// Deletes the active record if there is one, else the most recent
/// completed record.
pub fn reset(history: &mut PeriodHistory) -> Outcome {
    let target = history
        .active()
        .or_else(|| history.latest_completed())
        .map(|r| r.id);

    match target.and_then(|id| history.remove(id)) {
        Some(removed) => {
            tracing::info!(
                "Removed record {} started {}",
                removed.id,
                removed.start_date
            );
            Outcome::Removed(removed.id)
        }
        None => Outcome::Ignored(IgnoreReason::EmptyHistory),
    }
}
