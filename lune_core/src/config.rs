//! Configuration file support for Lune.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lune/config.toml`.

use crate::types::{
    clamp_cycle_length, clamp_period_length, default_cycle_length, default_period_length,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub cycle: CycleConfig,

    #[serde(default)]
    pub reminders: ReminderConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// How new records pick their cycle and period lengths
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    /// Learn lengths from the last completed record
    #[default]
    Auto,
    /// Always use the configured lengths
    Manual,
}

/// Cycle defaults used when starting and restarting periods
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default)]
    pub mode: CycleMode,

    #[serde(default = "default_cycle_length")]
    pub cycle_length: i32,

    #[serde(default = "default_period_length")]
    pub period_length: i32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            mode: CycleMode::default(),
            cycle_length: default_cycle_length(),
            period_length: default_period_length(),
        }
    }
}

impl CycleConfig {
    /// Configured cycle length, clamped to 15..=60
    pub fn cycle_length(&self) -> i32 {
        clamp_cycle_length(self.cycle_length as i64)
    }

    /// Configured period length, clamped to 1..=15
    pub fn period_length(&self) -> i32 {
        clamp_period_length(self.period_length as i64)
    }
}

/// Reminder computation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How many days ahead to warn about the next period
    #[serde(default = "default_days_before")]
    pub days_before: i64,

    /// Also remind about fertile window and ovulation
    #[serde(default)]
    pub fertility: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            days_before: default_days_before(),
            fertility: false,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("lune")
}

fn default_true() -> bool {
    true
}

fn default_days_before() -> i64 {
    2
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that cannot be clamped into something meaningful
    pub fn validate(&self) -> Result<()> {
        if self.reminders.days_before < 0 {
            return Err(Error::Config(format!(
                "reminders.days_before must not be negative (got {})",
                self.reminders.days_before
            )));
        }
        if self.cycle.cycle_length <= 0 || self.cycle.period_length <= 0 {
            return Err(Error::Config(
                "cycle lengths must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("lune").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
