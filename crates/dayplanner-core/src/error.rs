//! Core error types for dayplanner-core.
//!
//! Caller input errors live in [`ValidationError`] and are always returned
//! synchronously. Store access problems live in [`StoreError`]; the reminder
//! monitor swallows them per cycle instead of surfacing them.

use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

use crate::task::TaskId;

/// Core error type for dayplanner-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected input (title, time range, duration)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Schedule store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
///
/// A rejected mutation leaves the target untouched; the message names the
/// invariant that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty or whitespace only
    #[error("Invalid title: task title cannot be empty")]
    InvalidTitle,

    /// End is not strictly after start
    #[error("Invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    /// Slot search requested with a non-positive duration
    #[error("Invalid duration: {minutes} minutes (must be positive)")]
    InvalidDuration { minutes: i64 },
}

/// Schedule store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be read this time (e.g. a poisoned lock)
    #[error("Transient read failure: {0}")]
    TransientReadFailure(String),

    /// No task with this identifier exists on the date
    #[error("Task {0} not found")]
    TaskNotFound(TaskId),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_message_names_both_bounds() {
        let err = ValidationError::InvalidTimeRange {
            start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("10:00:00"));
        assert!(msg.contains("09:30:00"));
    }

    #[test]
    fn validation_converts_into_core_error() {
        let err: CoreError = ValidationError::InvalidTitle.into();
        assert!(matches!(err, CoreError::Validation(ValidationError::InvalidTitle)));
    }
}
