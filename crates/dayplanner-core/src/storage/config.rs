//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Reminder monitor cadence and thresholds
//! - Work-day window used by slot search
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/dayplanner/config.toml`.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::placement::WorkDay;

/// Reminder monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Width of the "starting soon" / "ending soon" windows.
    #[serde(default = "default_reminder_lead_minutes")]
    pub reminder_lead_minutes: u32,
    #[serde(default = "default_break_warning_minutes")]
    pub break_warning_minutes: u32,
    #[serde(default = "default_break_interval_minutes")]
    pub break_interval_minutes: u32,
}

/// Work-day window for slot search, as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDayConfig {
    #[serde(default = "default_work_day_start")]
    pub start: String,
    #[serde(default = "default_work_day_end")]
    pub end: String,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/dayplanner/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub work_day: WorkDayConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_reminder_lead_minutes() -> u32 {
    5
}
fn default_break_warning_minutes() -> u32 {
    55
}
fn default_break_interval_minutes() -> u32 {
    60
}
fn default_work_day_start() -> String {
    "09:00".into()
}
fn default_work_day_end() -> String {
    "17:00".into()
}
fn default_true() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            reminder_lead_minutes: default_reminder_lead_minutes(),
            break_warning_minutes: default_break_warning_minutes(),
            break_interval_minutes: default_break_interval_minutes(),
        }
    }
}

impl Default for WorkDayConfig {
    fn default() -> Self {
        Self {
            start: default_work_day_start(),
            end: default_work_day_end(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }

    pub fn reminder_lead(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.reminder_lead_minutes))
    }

    pub fn break_warning(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.break_warning_minutes))
    }

    pub fn break_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.break_interval_minutes))
    }

    /// Reject settings that would let a poll skip over a reminder window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: format!("monitor.{key}"),
            message: message.to_string(),
        };
        if self.reminder_lead_minutes == 0 {
            return Err(invalid("reminder_lead_minutes", "must be positive"));
        }
        if self.poll_interval_secs == 0
            || self.poll_interval_secs >= u64::from(self.reminder_lead_minutes) * 60
        {
            return Err(invalid(
                "poll_interval_secs",
                "must be positive and shorter than the reminder lead time",
            ));
        }
        if self.break_interval_minutes == 0 {
            return Err(invalid("break_interval_minutes", "must be positive"));
        }
        if self.break_warning_minutes >= self.break_interval_minutes {
            return Err(invalid(
                "break_warning_minutes",
                "must be less than break_interval_minutes",
            ));
        }
        Ok(())
    }
}

impl WorkDayConfig {
    pub fn work_day(&self) -> Result<WorkDay, ConfigError> {
        let start = parse_hhmm("work_day.start", &self.start)?;
        let end = parse_hhmm("work_day.end", &self.end)?;
        WorkDay::new(start, end).map_err(|e| ConfigError::InvalidValue {
            key: "work_day".into(),
            message: e.to_string(),
        })
    }
}

fn parse_hhmm(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| ConfigError::InvalidValue {
        key: key.into(),
        message: format!("expected HH:MM, got '{value}': {e}"),
    })
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.into(),
            message: "unknown config key".into(),
        };
        let bad_value = |message: String| ConfigError::InvalidValue {
            key: key.into(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| bad_value(format!("cannot parse '{value}': {e}")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| bad_value(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(bad_value("cannot replace a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Check every section. Called before anything is persisted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()?;
        self.work_day.work_day()?;
        Ok(())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/dayplanner"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, or write and return defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// The updated config must pass [`Self::validate`]; on failure `self`
    /// is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}
