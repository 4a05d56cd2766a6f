//! Temporal placement: conflict detection and next-free-slot search.
//!
//! Both operations are pure functions of the task list they are handed. The
//! caller passes the *other* tasks on the same date; the task being edited is
//! excluded either by leaving it out or through the `exclude` id.
//!
//! Overlap is inclusive: two intervals that merely touch (`09:00-10:00` and
//! `10:00-11:00`) conflict. Completed tasks never conflict.

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::sorted_by_start;
use crate::task::{Task, TaskId};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Window that slot search is allowed to place work into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkDay {
    start: NaiveTime,
    end: NaiveTime,
}

impl WorkDay {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }
}

impl Default for WorkDay {
    /// 09:00 to 17:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Outcome of checking a proposed time range against a day's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Placement {
    /// No conflict (or the range is not fully timed).
    Free,
    /// The range conflicts; `suggestion` is the earliest slot of the same
    /// length, if the work day has one.
    Conflict {
        suggestion: Option<(NaiveTime, NaiveTime)>,
    },
}

/// Placement engine parameterised by the work-day window.
#[derive(Debug, Clone, Default)]
pub struct PlacementEngine {
    work_day: WorkDay,
}

impl PlacementEngine {
    /// Engine with the default 09:00-17:00 window.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_work_day(mut self, work_day: WorkDay) -> Self {
        self.work_day = work_day;
        self
    }

    pub fn work_day(&self) -> WorkDay {
        self.work_day
    }

    /// Whether `[start, end]` touches or intersects any other pending, timed
    /// task. Unset bounds never overlap. Independent of the work day.
    pub fn has_overlap(
        &self,
        tasks: &[Task],
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
        exclude: Option<TaskId>,
    ) -> bool {
        let (Some(start), Some(end)) = (start, end) else {
            return false;
        };
        tasks
            .iter()
            .filter(|t| Some(t.id()) != exclude && !t.is_done())
            .filter_map(|t| Some((t.start()?, t.end()?)))
            .any(|(other_start, other_end)| start <= other_end && end >= other_start)
    }

    /// Earliest start inside the work day where `duration_minutes` fits
    /// without running into a pending, timed task.
    ///
    /// Greedy earliest-fit: pending timed tasks are sorted by start and
    /// walked once with a cursor that only moves forward. A candidate fits
    /// if it ends at or before the next task's start; after the last task it
    /// must end at or before the work-day end.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidDuration`] when `duration_minutes <= 0`.
    /// A duration longer than the whole work day is `Ok(None)`.
    pub fn find_next_available_slot(
        &self,
        tasks: &[Task],
        duration_minutes: i64,
    ) -> Result<Option<NaiveTime>, ValidationError> {
        if duration_minutes <= 0 {
            return Err(ValidationError::InvalidDuration {
                minutes: duration_minutes,
            });
        }
        let day_start = minute_of_day(self.work_day.start);
        let day_end = minute_of_day(self.work_day.end);
        // Keeps every `cursor + duration_minutes` below within a day's minutes.
        if duration_minutes > day_end - day_start {
            return Ok(None);
        }

        let scheduled = sorted_by_start(
            tasks
                .iter()
                .filter(|t| !t.is_done() && t.is_timed())
                .cloned()
                .collect(),
        );

        let mut cursor = day_start;
        for task in &scheduled {
            let (Some(task_start), Some(task_end)) = (task.start(), task.end()) else {
                continue;
            };
            if cursor + duration_minutes <= minute_of_day(task_start) {
                return Ok(time_of_minute(cursor));
            }
            cursor = cursor.max(minute_of_day(task_end));
        }

        if cursor + duration_minutes <= day_end {
            Ok(time_of_minute(cursor))
        } else {
            Ok(None)
        }
    }

    /// Check a proposed range and, on conflict, propose the earliest free
    /// slot of the same length.
    pub fn suggest_placement(
        &self,
        tasks: &[Task],
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
        exclude: Option<TaskId>,
    ) -> Result<Placement, ValidationError> {
        if !self.has_overlap(tasks, start, end, exclude) {
            return Ok(Placement::Free);
        }
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(Placement::Free);
        };
        let minutes = (end - start).num_minutes();
        let others: Vec<Task> = tasks
            .iter()
            .filter(|t| Some(t.id()) != exclude)
            .cloned()
            .collect();
        let suggestion = self
            .find_next_available_slot(&others, minutes)?
            .map(|slot| (slot, slot + Duration::minutes(minutes)));
        Ok(Placement::Conflict { suggestion })
    }
}

/// [`PlacementEngine::has_overlap`] with default settings.
pub fn has_overlap(
    tasks: &[Task],
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    exclude: Option<TaskId>,
) -> bool {
    PlacementEngine::new().has_overlap(tasks, start, end, exclude)
}

/// [`PlacementEngine::find_next_available_slot`] over the 09:00-17:00 day.
pub fn find_next_available_slot(
    tasks: &[Task],
    duration_minutes: i64,
) -> Result<Option<NaiveTime>, ValidationError> {
    PlacementEngine::new().find_next_available_slot(tasks, duration_minutes)
}

fn minute_of_day(t: NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight() / 60)
}

fn time_of_minute(minute: i64) -> Option<NaiveTime> {
    if !(0..MINUTES_PER_DAY).contains(&minute) {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt((minute * 60) as u32, 0)
}
