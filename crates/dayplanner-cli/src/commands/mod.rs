pub mod config;
pub mod monitor;
pub mod slot;
pub mod task;

use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use dayplanner_core::clock::{Clock, SystemClock};
use dayplanner_core::storage::{self, ScheduleStore};
use dayplanner_core::{MonthlyStats, TaskId};

/// Schedule snapshot plus monthly counters, loaded from the data directory.
pub(crate) struct Workspace {
    pub store: ScheduleStore,
    pub stats: Arc<MonthlyStats>,
    schedule_path: PathBuf,
    stats_path: PathBuf,
}

impl Workspace {
    pub fn open() -> Result<Self, Box<dyn Error>> {
        let schedule_path = storage::schedule_path()?;
        let stats_path = storage::data_dir()?.join("stats.json");

        let counts = match std::fs::read_to_string(&stats_path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        let stats = Arc::new(MonthlyStats::from_counts(counts));
        let store = ScheduleStore::load_from(&schedule_path)?.with_stats(stats.clone());

        Ok(Self {
            store,
            stats,
            schedule_path,
            stats_path,
        })
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        self.store.save_to(&self.schedule_path)?;
        std::fs::write(
            &self.stats_path,
            serde_json::to_string_pretty(&self.stats.snapshot())?,
        )?;
        Ok(())
    }

    /// Resolve a full task id or a unique prefix of one on `date`.
    pub fn resolve(&self, date: NaiveDate, id: &str) -> Result<TaskId, Box<dyn Error>> {
        if let Ok(id) = id.parse::<TaskId>() {
            return Ok(id);
        }
        let matches: Vec<TaskId> = self
            .store
            .get_tasks(date)
            .iter()
            .map(|t| t.id())
            .filter(|t| t.to_string().starts_with(id))
            .collect();
        match matches.as_slice() {
            [only] => Ok(*only),
            [] => Err(format!("no task matching '{id}' on {date}").into()),
            _ => Err(format!("'{id}' matches more than one task on {date}").into()),
        }
    }
}

pub(crate) fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| SystemClock.today())
}

/// Parse `HH:MM` (or `HH:MM:SS`).
pub(crate) fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{s}', expected HH:MM"))
}

/// Parse `YYYY-MM-DD`.
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD"))
}
