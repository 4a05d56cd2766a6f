mod config;
pub mod schedule_store;

pub use config::{Config, MonitorConfig, NotificationsConfig, WorkDayConfig};
pub use schedule_store::{sorted_by_start, DayProgress, ScheduleSource, ScheduleStore};

use std::path::PathBuf;

/// Returns `~/.config/dayplanner[-dev]/` based on DAYPLANNER_ENV.
///
/// Set DAYPLANNER_ENV=dev to use the development data directory, or
/// DAYPLANNER_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("DAYPLANNER_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DAYPLANNER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("dayplanner-dev")
            } else {
                base_dir.join("dayplanner")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Location of the JSON schedule snapshot inside [`data_dir`].
pub fn schedule_path() -> std::io::Result<PathBuf> {
    Ok(data_dir()?.join("schedule.json"))
}
