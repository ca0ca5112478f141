//! Reminder computation.
//!
//! Works out which reminders are due on a given day. Delivering them
//! (desktop notifications, push, ...) is up to the caller.
//!
//! Rules, evaluated in order:
//! 1. Nothing when reminders are disabled.
//! 2. An active record suppresses period reminders (the period is here).
//! 3. The forecast period start is 1..=`days_before` days away → expected.
//! 4. Today is the forecast period start → due.
//! 5. With fertility reminders on: the first fertile day, and ovulation day.

use crate::config::ReminderConfig;
use crate::predictor::{classify, forecast};
use crate::types::{days_between, DayStatus};
use crate::PeriodRecord;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reminder {
    PeriodExpected { in_days: i64, on: NaiveDate },
    PeriodDue,
    FertileWindowOpens { until: NaiveDate },
    OvulationDay,
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reminder::PeriodExpected { in_days: 1, on } => {
                write!(f, "Period expected tomorrow ({})", on)
            }
            Reminder::PeriodExpected { in_days, on } => {
                write!(f, "Period expected in {} days ({})", in_days, on)
            }
            Reminder::PeriodDue => f.write_str("Period expected today"),
            Reminder::FertileWindowOpens { until } => {
                write!(f, "Fertile window opens today (until {})", until)
            }
            Reminder::OvulationDay => f.write_str("Estimated ovulation day"),
        }
    }
}

/// Reminders due on `today`
pub fn due_reminders(
    records: &[PeriodRecord],
    today: NaiveDate,
    config: &ReminderConfig,
) -> Vec<Reminder> {
    let mut due = Vec::new();
    if !config.enabled {
        return due;
    }

    let Some(upcoming) = forecast(records, today) else {
        tracing::debug!("No forecast for {}, no reminders", today);
        return due;
    };

    let has_active = records.iter().any(|r| r.is_active());
    if !has_active {
        let in_days = days_between(today, upcoming.next_period_start);
        if in_days == 0 && classify(records, today) == DayStatus::PredictedPeriod {
            due.push(Reminder::PeriodDue);
        } else if (1..=config.days_before).contains(&in_days) {
            due.push(Reminder::PeriodExpected {
                in_days,
                on: upcoming.next_period_start,
            });
        }
    }

    if config.fertility {
        let status = classify(records, today);
        let yesterday = classify(records, today - Duration::days(1));

        if status == DayStatus::Ovulation {
            due.push(Reminder::OvulationDay);
        } else if status == DayStatus::Fertile
            && !matches!(yesterday, DayStatus::Fertile | DayStatus::Ovulation)
        {
            due.push(Reminder::FertileWindowOpens {
                until: upcoming.fertile_end,
            });
        }
    }

    tracing::debug!("{} reminders due on {}", due.len(), today);
    due
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap() + Duration::days(n)
    }

    fn history() -> Vec<PeriodRecord> {
        vec![PeriodRecord::new(day(0), 28, 5).completed(day(4))]
    }

    fn config() -> ReminderConfig {
        ReminderConfig {
            enabled: true,
            days_before: 2,
            fertility: true,
        }
    }

    #[test]
    fn test_period_expected_window() {
        let records = history();
        let cfg = ReminderConfig {
            fertility: false,
            ..config()
        };

        assert!(due_reminders(&records, day(25), &cfg).is_empty());
        assert_eq!(
            due_reminders(&records, day(26), &cfg),
            vec![Reminder::PeriodExpected { in_days: 2, on: day(28) }]
        );
        assert_eq!(
            due_reminders(&records, day(27), &cfg),
            vec![Reminder::PeriodExpected { in_days: 1, on: day(28) }]
        );
        assert_eq!(due_reminders(&records, day(28), &cfg), vec![Reminder::PeriodDue]);
        assert!(due_reminders(&records, day(29), &cfg).is_empty());
    }

    #[test]
    fn test_active_record_suppresses_period_reminders() {
        let mut records = history();
        records.insert(0, PeriodRecord::new(day(27), 28, 5));
        let cfg = ReminderConfig {
            fertility: false,
            ..config()
        };
        assert!(due_reminders(&records, day(27), &cfg).is_empty());
    }

    #[test]
    fn test_fertility_reminders() {
        let records = history();
        // fertile 9..=15, ovulation 14
        assert_eq!(
            due_reminders(&records, day(9), &config()),
            vec![Reminder::FertileWindowOpens { until: day(15) }]
        );
        assert!(due_reminders(&records, day(10), &config()).is_empty());
        assert_eq!(
            due_reminders(&records, day(14), &config()),
            vec![Reminder::OvulationDay]
        );
    }

    #[test]
    fn test_disabled_or_unpredictable() {
        let cfg = ReminderConfig {
            enabled: false,
            ..config()
        };
        assert!(due_reminders(&history(), day(27), &cfg).is_empty());

        let only_active = vec![PeriodRecord::new(day(0), 28, 5)];
        assert!(due_reminders(&only_active, day(27), &config()).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Reminder::PeriodExpected { in_days: 1, on: day(28) }.to_string(),
            "Period expected tomorrow (2024-07-29)"
        );
        assert_eq!(Reminder::PeriodDue.to_string(), "Period expected today");
    }
}
