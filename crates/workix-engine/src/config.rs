//! # Engine Configuration
//!
//! Loaded from a YAML file, then overridden from the environment.
//!
//! ```yaml
//! scheduler:
//!   interval_secs: 60
//!   max_concurrency: 16
//! calendar:
//!   utc_offset_minutes: 0
//!   workdays: [mon, tue, wed, thu, fri]
//!   open: "09:00"
//!   close: "17:00"
//!   holidays: ["2026-12-25"]
//! notifications:
//!   max_retries: 3
//!   base_delay_ms: 200
//!   channels: [push, email]
//!   webhook_url: https://hooks.example.com/sla
//! ```
//!
//! Environment variables:
//! - `WORKIX_SWEEP_INTERVAL_SECS`
//! - `WORKIX_CALENDAR_UTC_OFFSET_MINUTES`
//! - `WORKIX_NOTIFY_MAX_RETRIES`
//! - `WORKIX_NOTIFY_BASE_DELAY_MS`
//! - `WORKIX_WEBHOOK_URL`
//! - `DATABASE_URL`

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use workix_sla::{BusinessCalendar, CalendarError};

use crate::notify::RetryPolicy;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub max_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_concurrency: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub utc_offset_minutes: i32,
    /// Weekday names (`mon`, `Tuesday`, ...).
    pub workdays: Vec<String>,
    /// `HH:MM`, local to the offset.
    pub open: String,
    pub close: String,
    pub holidays: Vec<NaiveDate>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            workdays: ["mon", "tue", "wed", "thu", "fri"]
                .map(String::from)
                .to_vec(),
            open: "09:00".to_string(),
            close: "17:00".to_string(),
            holidays: Vec::new(),
        }
    }
}

impl CalendarConfig {
    pub fn build(&self) -> Result<BusinessCalendar, ConfigError> {
        let workdays = self
            .workdays
            .iter()
            .map(|d| {
                d.parse::<Weekday>()
                    .map_err(|_| ConfigError::Invalid(format!("unknown weekday {d:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let open = parse_hhmm(&self.open)?;
        let close = parse_hhmm(&self.close)?;
        let calendar = BusinessCalendar::new(self.utc_offset_minutes, &workdays, open, close)?
            .with_holidays(self.holidays.iter().copied());
        Ok(calendar)
    }
}

fn parse_hhmm(s: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| ConfigError::Invalid(format!("invalid time {s:?}: {e}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Log-backed channels: `push`, `email`, `sms`.
    pub channels: Vec<String>,
    pub webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            channels: vec!["push".to_string(), "email".to_string()],
            webhook_url: None,
            webhook_timeout_secs: 10,
        }
    }
}

impl NotificationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub calendar: CalendarConfig,
    pub notifications: NotificationConfig,
    /// Postgres URL. Required by every CLI command that touches the store.
    pub database_url: Option<String>,
}

impl EngineConfig {
    /// Load from a YAML file, apply environment overrides, validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&raw)?;
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = parse_var(&lookup, "WORKIX_SWEEP_INTERVAL_SECS")? {
            self.scheduler.interval_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "WORKIX_CALENDAR_UTC_OFFSET_MINUTES")? {
            self.calendar.utc_offset_minutes = v;
        }
        if let Some(v) = parse_var(&lookup, "WORKIX_NOTIFY_MAX_RETRIES")? {
            self.notifications.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "WORKIX_NOTIFY_BASE_DELAY_MS")? {
            self.notifications.base_delay_ms = v;
        }
        if let Some(url) = lookup("WORKIX_WEBHOOK_URL").filter(|s| !s.is_empty()) {
            self.notifications.webhook_url = Some(url);
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
            self.database_url = Some(url);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.scheduler.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.max_concurrency must be greater than 0".to_string(),
            ));
        }
        self.calendar.build()?;
        for channel in &self.notifications.channels {
            channel
                .parse::<crate::notify::ChannelKind>()
                .map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}
