//! Date-keyed schedule store.
//!
//! The store owns every [`Task`]. Callers and the reminder monitor see cloned
//! snapshots and refer back to tasks by [`TaskId`]. Each public operation takes
//! the lock exactly once, so a reader never observes a half-applied mutation.
//! There is no transaction spanning several operations: an overlap check
//! followed by an add can race with another add.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError, ValidationError};
use crate::stats::{CounterDelta, StatsSink};
use crate::task::{Task, TaskId};

/// Read port used by the reminder monitor.
pub trait ScheduleSource: Send + Sync {
    /// Tasks for `date`, or a transient failure the caller may retry later.
    fn tasks_for(&self, date: NaiveDate) -> std::result::Result<Vec<Task>, StoreError>;
}

/// Completion summary for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub done: usize,
    pub total: usize,
    /// 0.0 .. 100.0; an empty day counts as fully done.
    pub percent: f64,
    pub pending: Vec<String>,
}

/// Mapping from calendar date to that day's tasks.
#[derive(Default)]
pub struct ScheduleStore {
    days: RwLock<HashMap<NaiveDate, Vec<Task>>>,
    stats: Option<Arc<dyn StatsSink>>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report counter deltas for every add, remove and completion toggle.
    pub fn with_stats(mut self, sink: Arc<dyn StatsSink>) -> Self {
        self.stats = Some(sink);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Tasks for `date` in insertion order; empty when nothing is scheduled.
    pub fn get_tasks(&self, date: NaiveDate) -> Vec<Task> {
        self.read().get(&date).cloned().unwrap_or_default()
    }

    pub fn get_task(&self, date: NaiveDate, id: TaskId) -> Option<Task> {
        self.read()
            .get(&date)
            .and_then(|tasks| tasks.iter().find(|t| t.id() == id))
            .cloned()
    }

    /// Dates that have an entry, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<_> = self.read().keys().copied().collect();
        dates.sort();
        dates
    }

    pub fn progress(&self, date: NaiveDate) -> DayProgress {
        let tasks = self.get_tasks(date);
        let total = tasks.len();
        let done = tasks.iter().filter(|t| t.is_done()).count();
        let percent = if total == 0 {
            100.0
        } else {
            done as f64 * 100.0 / total as f64
        };
        DayProgress {
            date,
            done,
            total,
            percent,
            pending: tasks
                .iter()
                .filter(|t| !t.is_done())
                .map(|t| t.title().to_string())
                .collect(),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a task, creating the date entry on first use.
    pub fn add_task(&self, date: NaiveDate, task: Task) {
        let delta = CounterDelta {
            date,
            completed_delta: i32::from(task.is_done()),
            total_delta: 1,
        };
        tracing::debug!(%date, id = %task.id(), title = task.title(), "task added");
        self.write().entry(date).or_default().push(task);
        self.emit(delta);
    }

    /// Remove the task with `id`; no-op if it is not there.
    pub fn remove_task(&self, date: NaiveDate, id: TaskId) -> Option<Task> {
        let removed = {
            let mut days = self.write();
            let tasks = days.get_mut(&date)?;
            let index = tasks.iter().position(|t| t.id() == id)?;
            tasks.remove(index)
        };
        tracing::debug!(%date, %id, "task removed");
        self.emit(CounterDelta {
            date,
            completed_delta: -i32::from(removed.is_done()),
            total_delta: -1,
        });
        Some(removed)
    }

    /// Apply a validated edit to a task.
    ///
    /// The edit runs on a scratch copy which replaces the stored task only if
    /// it succeeds.
    ///
    /// # Errors
    ///
    /// [`StoreError::TaskNotFound`] for an unknown id, or whatever
    /// [`ValidationError`] the edit returns.
    pub fn update_task<F>(&self, date: NaiveDate, id: TaskId, edit: F) -> Result<Task>
    where
        F: FnOnce(&mut Task) -> std::result::Result<(), ValidationError>,
    {
        let (before, after) = {
            let mut days = self.write();
            let slot = days
                .get_mut(&date)
                .and_then(|tasks| tasks.iter_mut().find(|t| t.id() == id))
                .ok_or(StoreError::TaskNotFound(id))?;
            let mut draft = slot.clone();
            edit(&mut draft)?;
            let before = std::mem::replace(slot, draft);
            (before, slot.clone())
        };
        self.emit_done_change(date, before.is_done(), after.is_done());
        Ok(after)
    }

    /// Set the completion flag.
    pub fn set_done(&self, date: NaiveDate, id: TaskId, done: bool) -> Result<()> {
        self.update_task(date, id, |task| {
            task.set_done(done);
            Ok(())
        })?;
        Ok(())
    }

    /// Complete every pending task on `date`. Returns how many changed.
    pub fn mark_all_done(&self, date: NaiveDate) -> usize {
        let changed = {
            let mut days = self.write();
            days.get_mut(&date)
                .map(|tasks| {
                    tasks
                        .iter_mut()
                        .filter(|t| !t.is_done())
                        .map(|t| t.set_done(true))
                        .count()
                })
                .unwrap_or(0)
        };
        if changed > 0 {
            self.emit(CounterDelta {
                date,
                completed_delta: changed as i32,
                total_delta: 0,
            });
        }
        changed
    }

    // ── Snapshot persistence ─────────────────────────────────────────

    /// Load a JSON snapshot written by [`Self::save_to`]. Missing file yields
    /// an empty store.
    pub fn load_from(path: &Path) -> Result<Self> {
        let days: BTreeMap<NaiveDate, Vec<Task>> = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            days: RwLock::new(days.into_iter().collect()),
            stats: None,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let days: BTreeMap<NaiveDate, Vec<Task>> = self
            .read()
            .iter()
            .filter(|(_, tasks)| !tasks.is_empty())
            .map(|(date, tasks)| (*date, tasks.clone()))
            .collect();
        let content = serde_json::to_string_pretty(&days)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    // A panic can only poison the lock while an edit runs on a scratch copy,
    // so the map itself is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<NaiveDate, Vec<Task>>> {
        self.days.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<NaiveDate, Vec<Task>>> {
        self.days.write().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, delta: CounterDelta) {
        if let Some(sink) = &self.stats {
            sink.record(delta);
        }
    }

    fn emit_done_change(&self, date: NaiveDate, before: bool, after: bool) {
        if before != after {
            self.emit(CounterDelta {
                date,
                completed_delta: if after { 1 } else { -1 },
                total_delta: 0,
            });
        }
    }
}

impl ScheduleSource for ScheduleStore {
    fn tasks_for(&self, date: NaiveDate) -> std::result::Result<Vec<Task>, StoreError> {
        let days = self
            .days
            .read()
            .map_err(|e| StoreError::TransientReadFailure(e.to_string()))?;
        Ok(days.get(&date).cloned().unwrap_or_default())
    }
}

/// Sort chronologically by start time. Tasks without a start go last.
pub fn sorted_by_start(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| match (a.start(), b.start()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    tasks
}
