#![forbid(unsafe_code)]

//! Core domain model and business logic for Lune, a local period tracker.
//!
//! This crate provides:
//! - Domain types (period records, day status, phases, journal entries)
//! - Cycle prediction and the "today" summary
//! - Period start/end/reset rules
//! - Persistence (record snapshot, JSONL journal, CSV export)
//! - Reminder computation
//! - The `Tracker` service tying these together

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod history;
pub mod predictor;
pub mod summary;
pub mod episode;
pub mod store;
pub mod journal;
pub mod export;
pub mod reminder;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, CycleConfig, CycleMode, ReminderConfig};
pub use history::PeriodHistory;
pub use predictor::{classify, forecast, month_calendar};
pub use summary::summarize;
pub use episode::{IgnoreReason, Outcome};
pub use store::RecordStore;
pub use journal::{JournalSink, JsonlJournal};
pub use reminder::{due_reminders, Reminder};
pub use tracker::{recompute, CycleView, Tracker};
