use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use lune_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lune")]
#[command(about = "Local period tracker with cycle prediction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's cycle summary (default)
    Status {
        /// Day to show instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Log the start of a period
    Start {
        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Log the end of the ongoing period
    End {
        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Remove the ongoing period, or the latest one if none is ongoing
    Reset,

    /// Show a month calendar with recorded and predicted days
    Calendar {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },

    /// List all period records
    History,

    /// Add a diary entry
    Diary {
        text: String,

        #[arg(long)]
        mood: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Log last night's sleep
    Sleep {
        #[arg(long)]
        hours: f32,

        /// Quality from 1 (poor) to 5 (great)
        #[arg(long)]
        quality: Option<u8>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Show recent journal entries
    Journal {
        /// How many days back to show
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Show reminders due today
    Remind {
        #[arg(long)]
        date: Option<String>,
    },

    /// Export the period history to CSV
    Export { path: PathBuf },

    /// Import period records from a CSV export
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    lune_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Status { date }) => cmd_status(&data_dir, &config, date),
        Some(Commands::Start { date }) => cmd_start(&data_dir, &config, date),
        Some(Commands::End { date }) => cmd_end(&data_dir, &config, date),
        Some(Commands::Reset) => cmd_reset(&data_dir, &config),
        Some(Commands::Calendar { month }) => cmd_calendar(&data_dir, &config, month),
        Some(Commands::History) => cmd_history(&data_dir, &config),
        Some(Commands::Diary { text, mood, date }) => {
            let kind = JournalKind::Diary { text, mood };
            cmd_journal_add(&data_dir, &config, date, kind)
        }
        Some(Commands::Sleep {
            hours,
            quality,
            date,
        }) => {
            validate_sleep(hours, quality)?;
            let kind = JournalKind::Sleep { hours, quality };
            cmd_journal_add(&data_dir, &config, date, kind)
        }
        Some(Commands::Journal { days }) => cmd_journal(&data_dir, &config, days),
        Some(Commands::Remind { date }) => cmd_remind(&data_dir, &config, date),
        Some(Commands::Export { path }) => cmd_export(&data_dir, &config, &path),
        Some(Commands::Import { path }) => cmd_import(&data_dir, &config, &path),
        None => cmd_status(&data_dir, &config, None),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_day(arg: Option<String>) -> Result<NaiveDate> {
    match arg {
        None => Ok(today()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| Error::Parse(format!("Invalid date {:?} (expected YYYY-MM-DD): {}", s, e))),
    }
}

fn parse_month(arg: Option<String>) -> Result<(i32, u32)> {
    let Some(s) = arg else {
        let now = today();
        return Ok((now.year(), now.month()));
    };

    let invalid = || Error::Parse(format!("Invalid month {:?} (expected YYYY-MM)", s));
    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

fn validate_sleep(hours: f32, quality: Option<u8>) -> Result<()> {
    if !(0.0..=24.0).contains(&hours) {
        return Err(Error::Parse(format!("Sleep hours must be between 0 and 24, got {}", hours)));
    }
    if let Some(q) = quality {
        if !(1..=5).contains(&q) {
            return Err(Error::Parse(format!("Sleep quality must be 1-5, got {}", q)));
        }
    }
    Ok(())
}

fn cmd_status(data_dir: &Path, config: &Config, date: Option<String>) -> Result<()> {
    let day = parse_day(date)?;
    let tracker = Tracker::open(data_dir, config)?;
    let view = tracker.view(day);
    display_view(&view);
    Ok(())
}

fn cmd_start(data_dir: &Path, config: &Config, date: Option<String>) -> Result<()> {
    let day = parse_day(date)?;
    let mut tracker = Tracker::open(data_dir, config)?;

    match tracker.start_period(day)? {
        Outcome::Started(_) => println!("✓ Period started on {}", day),
        Outcome::Restarted(id) => {
            let start = tracker.history().get(id).map(|r| r.start_date).unwrap_or(day);
            println!("✓ Re-opened the period started on {}", start);
        }
        Outcome::Ignored(reason) => println!("Nothing to do: {}", reason),
        other => tracing::warn!("Unexpected outcome for start: {:?}", other),
    }
    Ok(())
}

fn cmd_end(data_dir: &Path, config: &Config, date: Option<String>) -> Result<()> {
    let day = parse_day(date)?;
    let mut tracker = Tracker::open(data_dir, config)?;

    match tracker.end_period(day)? {
        Outcome::Ended {
            id,
            period_length,
            discarded,
        } => {
            let end = tracker
                .history()
                .get(id)
                .and_then(|r| r.end_date)
                .unwrap_or(day);
            println!("✓ Period ended on {} ({} days)", end, period_length);
            if discarded > 0 {
                println!("  Removed {} stale ongoing records", discarded);
            }
        }
        Outcome::Ignored(reason) => println!("Nothing to do: {}", reason),
        other => tracing::warn!("Unexpected outcome for end: {:?}", other),
    }
    Ok(())
}

fn cmd_reset(data_dir: &Path, config: &Config) -> Result<()> {
    let mut tracker = Tracker::open(data_dir, config)?;
    let history = tracker.history();
    let latest = history
        .active()
        .or_else(|| history.latest_completed())
        .map(|r| r.start_date);

    match tracker.reset()? {
        Outcome::Removed(_) => match latest {
            Some(start) => println!("✓ Removed the period started on {}", start),
            None => println!("✓ Removed the latest period"),
        },
        Outcome::Ignored(reason) => println!("Nothing to do: {}", reason),
        other => tracing::warn!("Unexpected outcome for reset: {:?}", other),
    }
    Ok(())
}

fn cmd_calendar(data_dir: &Path, config: &Config, month: Option<String>) -> Result<()> {
    let (year, month) = parse_month(month)?;
    let tracker = Tracker::open(data_dir, config)?;
    let days = month_calendar(tracker.history().records(), year, month)?;

    println!("\n  {}-{:02}", year, month);
    println!("  Mo  Tu  We  Th  Fr  Sa  Su");

    let mut line = String::from("  ");
    if let Some((first, _)) = days.first() {
        let lead = first.weekday().num_days_from_monday() as usize;
        line.push_str(&"    ".repeat(lead));
    }

    for (date, status) in &days {
        line.push_str(&format!("{:>2}{} ", date.day(), status.marker()));
        if date.weekday().num_days_from_monday() == 6 {
            println!("{}", line.trim_end());
            line = String::from("  ");
        }
    }
    if !line.trim().is_empty() {
        println!("{}", line.trim_end());
    }

    println!();
    println!(
        "  {} period  {} predicted  {} ovulation  {} fertile",
        DayStatus::Period.marker(),
        DayStatus::PredictedPeriod.marker(),
        DayStatus::Ovulation.marker(),
        DayStatus::Fertile.marker()
    );
    Ok(())
}

fn cmd_history(data_dir: &Path, config: &Config) -> Result<()> {
    let tracker = Tracker::open(data_dir, config)?;
    let history = tracker.history();

    if history.is_empty() {
        println!("No periods logged yet.");
        return Ok(());
    }

    for record in history.records() {
        let end = match record.end_date {
            Some(end) => end.to_string(),
            None => "ongoing   ".to_string(),
        };
        println!(
            "  {} → {}  {:>2} days  cycle {} days",
            record.start_date, end, record.period_length, record.cycle_length
        );
        for (label, value) in [
            ("symptoms", &record.symptoms),
            ("mood", &record.mood),
            ("notes", &record.notes),
        ] {
            if let Some(value) = value {
                println!("      {}: {}", label, value);
            }
        }
    }
    Ok(())
}

fn cmd_journal_add(
    data_dir: &Path,
    config: &Config,
    date: Option<String>,
    kind: JournalKind,
) -> Result<()> {
    let day = parse_day(date)?;
    let mut tracker = Tracker::open(data_dir, config)?;
    tracker.add_journal_entry(&JournalEntry::new(day, kind))?;
    println!("✓ Journal entry saved for {}", day);
    Ok(())
}

fn cmd_journal(data_dir: &Path, config: &Config, days: u32) -> Result<()> {
    let tracker = Tracker::open(data_dir, config)?;
    let entries = tracker.journal_entries(today(), days)?;

    if entries.is_empty() {
        println!("No journal entries in the last {} days.", days);
        return Ok(());
    }

    for entry in &entries {
        match &entry.kind {
            JournalKind::Diary { text, mood } => match mood {
                Some(mood) => println!("  {}  diary  [{}] {}", entry.date, mood, text),
                None => println!("  {}  diary  {}", entry.date, text),
            },
            JournalKind::Sleep { hours, quality } => match quality {
                Some(q) => println!("  {}  sleep  {:.1} h, quality {}/5", entry.date, hours, q),
                None => println!("  {}  sleep  {:.1} h", entry.date, hours),
            },
        }
    }
    Ok(())
}

fn cmd_remind(data_dir: &Path, config: &Config, date: Option<String>) -> Result<()> {
    let day = parse_day(date)?;
    let tracker = Tracker::open(data_dir, config)?;
    let reminders = due_reminders(tracker.history().records(), day, &config.reminders);

    if reminders.is_empty() {
        println!("No reminders for {}.", day);
    }
    for reminder in reminders {
        println!("  • {}", reminder);
    }
    Ok(())
}

fn cmd_export(data_dir: &Path, config: &Config, path: &Path) -> Result<()> {
    let tracker = Tracker::open(data_dir, config)?;
    let count = tracker.export_csv(path)?;
    println!("✓ Exported {} records to {}", count, path.display());
    Ok(())
}

fn cmd_import(data_dir: &Path, config: &Config, path: &Path) -> Result<()> {
    let mut tracker = Tracker::open(data_dir, config)?;
    let added = tracker.import_csv(path)?;
    println!("✓ Imported {} new records from {}", added, path.display());
    Ok(())
}

fn display_view(view: &CycleView) {
    let summary = &view.summary;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}  ·  {}", view.today, summary.phase);
    println!("╰─────────────────────────────────────────╯");
    println!();

    if summary.phase == Phase::NoRecords {
        println!("  Log your first period with `lune start`.");
        println!();
        return;
    }

    if summary.cycle_day > 0 {
        println!("  Cycle day: {}", summary.cycle_day);
    }
    println!("  Today: {}", view.status);

    if let Some(days) = summary.days_until_next_period {
        println!("  Next period in {} days", days);
    }
    if let Some(days) = summary.days_until_ovulation {
        println!("  Ovulation in {} days", days);
    }

    if let Some(forecast) = &view.forecast {
        println!();
        println!(
            "  Predicted period: {} → {}",
            forecast.next_period_start, forecast.next_period_end
        );
        println!(
            "  Fertile window:   {} → {} (ovulation {})",
            forecast.fertile_start, forecast.fertile_end, forecast.ovulation
        );
    }

    println!();
    println!("  Cycle  {}", progress_bar(summary.cycle_progress));
    if summary.is_in_period {
        println!("  Period {}", progress_bar(summary.period_progress));
    }
    println!();
}

fn progress_bar(ratio: f64) -> String {
    const WIDTH: usize = 20;
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "█".repeat(filled),
        "░".repeat(WIDTH - filled),
        ratio * 100.0
    )
}
