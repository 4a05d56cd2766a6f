//! Task entity: one entry on a day's schedule.
//!
//! A task keeps its identity for life and validates every mutation. Setters
//! check the title and the start/end ordering before touching any field, so a
//! rejected edit leaves the task exactly as it was.
//!
//! ```text
//! start  ──────────── end      duration = end - start (derived)
//! start  ─── ?                 duration = fallback minutes
//!   ?                          duration = fallback minutes
//! ```

use std::fmt;

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Opaque, process-unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    fn generate() -> Self {
        TaskId(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TaskId)
    }
}

/// A scheduled unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    id: TaskId,
    title: String,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    /// Used only while start or end is missing.
    fallback_minutes: u32,
    done: bool,
}

impl Task {
    /// Create a task with optional start and end times.
    ///
    /// Times are truncated to the minute.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTitle`] for a blank title and
    /// [`ValidationError::InvalidTimeRange`] when both times are set and
    /// `end <= start`.
    pub fn new(
        title: &str,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Result<Self, ValidationError> {
        let title = normalize_title(title)?;
        let (start, end) = (start.map(to_minute), end.map(to_minute));
        check_range(start, end)?;
        Ok(Self {
            id: TaskId::generate(),
            title,
            start,
            end,
            fallback_minutes: 0,
            done: false,
        })
    }

    /// Create an untimed task that only carries a duration.
    ///
    /// Negative durations clamp to zero.
    pub fn with_duration(title: &str, minutes: i64) -> Result<Self, ValidationError> {
        let mut task = Self::new(title, None, None)?;
        task.set_duration_minutes(minutes);
        Ok(task)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> Option<NaiveTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveTime> {
        self.end
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Both start and end are set.
    pub fn is_timed(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Minutes between start and end when both are set, else the fallback.
    pub fn duration_minutes(&self) -> u32 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).num_minutes() as u32,
            _ => self.fallback_minutes,
        }
    }

    /// End time, or `start + fallback` for a task that only has a start.
    ///
    /// Returns `None` when there is no start, the fallback is zero, or the
    /// derived end would cross midnight.
    pub fn effective_end(&self) -> Option<NaiveTime> {
        if let Some(end) = self.end {
            return Some(end);
        }
        let start = self.start?;
        if self.fallback_minutes == 0 {
            return None;
        }
        let (end, wrapped) =
            start.overflowing_add_signed(Duration::minutes(i64::from(self.fallback_minutes)));
        (wrapped == 0).then_some(end)
    }

    /// Read-only projection for display and serialization to consumers.
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id,
            title: self.title.clone(),
            start: self.start,
            end: self.end,
            duration_minutes: self.duration_minutes(),
            done: self.done,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: &str) -> Result<(), ValidationError> {
        self.title = normalize_title(title)?;
        Ok(())
    }

    pub fn set_start(&mut self, start: Option<NaiveTime>) -> Result<(), ValidationError> {
        self.set_times(start, self.end)
    }

    pub fn set_end(&mut self, end: Option<NaiveTime>) -> Result<(), ValidationError> {
        self.set_times(self.start, end)
    }

    /// Replace both bounds in one validated step.
    pub fn set_times(
        &mut self,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Result<(), ValidationError> {
        let (start, end) = (start.map(to_minute), end.map(to_minute));
        check_range(start, end)?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Set the fallback duration. Ignored by [`Self::duration_minutes`] while
    /// both times are set.
    pub fn set_duration_minutes(&mut self, minutes: i64) {
        self.fallback_minutes = minutes.clamp(0, i64::from(u32::MAX)) as u32;
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                write!(f, " ({}-{})", start.format("%H:%M"), end.format("%H:%M"))?
            }
            (Some(start), None) => write!(f, " ({})", start.format("%H:%M"))?,
            (None, Some(end)) => write!(f, " (-{})", end.format("%H:%M"))?,
            (None, None) => {}
        }
        write!(
            f,
            " ({} min) {}",
            self.duration_minutes(),
            if self.done { "[DONE]" } else { "[PENDING]" }
        )
    }
}

/// Read-only view of a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub title: String,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub duration_minutes: u32,
    pub done: bool,
}

/// On-disk shape of a task. Conversion back into [`Task`] re-runs validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRecord {
    id: TaskId,
    title: String,
    #[serde(default)]
    start: Option<NaiveTime>,
    #[serde(default)]
    end: Option<NaiveTime>,
    #[serde(default)]
    duration_minutes: u32,
    #[serde(default)]
    done: bool,
}

impl TryFrom<TaskRecord> for Task {
    type Error = ValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let mut task = Task::new(&record.title, record.start, record.end)?;
        task.id = record.id;
        task.fallback_minutes = record.duration_minutes;
        task.done = record.done;
        Ok(task)
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        TaskRecord {
            id: task.id,
            title: task.title,
            start: task.start,
            end: task.end,
            duration_minutes: task.fallback_minutes,
            done: task.done,
        }
    }
}

fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}

fn check_range(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end <= start => {
            Err(ValidationError::InvalidTimeRange { start, end })
        }
        _ => Ok(()),
    }
}

fn to_minute(t: NaiveTime) -> NaiveTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn new_trims_title_and_derives_duration() {
        let task = Task::new("  Write report ", Some(hm(9, 0)), Some(hm(10, 30))).unwrap();
        assert_eq!(task.title(), "Write report");
        assert_eq!(task.duration_minutes(), 90);
        assert!(!task.is_done());
        assert!(task.is_timed());
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(
            Task::new("   ", None, None).unwrap_err(),
            ValidationError::InvalidTitle
        );
    }

    #[test]
    fn end_must_be_after_start() {
        let err = Task::new("x", Some(hm(10, 0)), Some(hm(10, 0))).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
        assert!(Task::new("x", Some(hm(10, 0)), Some(hm(9, 0))).is_err());
    }

    #[test]
    fn seconds_are_truncated() {
        let start = NaiveTime::from_hms_opt(9, 15, 42).unwrap();
        let task = Task::new("x", Some(start), None).unwrap();
        assert_eq!(task.start(), Some(hm(9, 15)));
    }

    #[test]
    fn rejected_setter_leaves_task_unchanged() {
        let mut task = Task::new("Standup", Some(hm(9, 0)), Some(hm(9, 15))).unwrap();
        let before = task.clone();

        assert!(task.set_end(Some(hm(8, 0))).is_err());
        assert!(task.set_start(Some(hm(9, 15))).is_err());
        assert!(task.set_title("").is_err());
        assert!(task.set_times(Some(hm(12, 0)), Some(hm(11, 0))).is_err());

        assert_eq!(task, before);
    }

    #[test]
    fn set_times_moves_both_bounds_at_once() {
        let mut task = Task::new("Review", Some(hm(9, 0)), Some(hm(10, 0))).unwrap();
        // Moving start first to 11:00 alone would be rejected.
        task.set_times(Some(hm(11, 0)), Some(hm(12, 0))).unwrap();
        assert_eq!(task.start(), Some(hm(11, 0)));
        assert_eq!(task.duration_minutes(), 60);
    }

    #[test]
    fn duration_tracks_time_changes() {
        let mut task = Task::new("x", Some(hm(9, 0)), Some(hm(10, 0))).unwrap();
        task.set_duration_minutes(5);
        assert_eq!(task.duration_minutes(), 60);
        task.set_end(Some(hm(9, 45))).unwrap();
        assert_eq!(task.duration_minutes(), 45);
        task.set_end(None).unwrap();
        assert_eq!(task.duration_minutes(), 5);
    }

    #[test]
    fn negative_fallback_duration_clamps_to_zero() {
        let task = Task::with_duration("Read", -20).unwrap();
        assert_eq!(task.duration_minutes(), 0);
    }

    #[test]
    fn effective_end_uses_fallback_for_start_only_tasks() {
        let mut task = Task::new("Call", Some(hm(14, 0)), None).unwrap();
        assert_eq!(task.effective_end(), None);
        task.set_duration_minutes(30);
        assert_eq!(task.effective_end(), Some(hm(14, 30)));

        let mut late = Task::new("Late", Some(hm(23, 50)), None).unwrap();
        late.set_duration_minutes(30);
        assert_eq!(late.effective_end(), None);
    }

    #[test]
    fn ids_are_unique() {
        let a = Task::new("a", None, None).unwrap();
        let b = Task::new("a", None, None).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn display_matches_schedule_listing() {
        let mut task = Task::new("Gym", Some(hm(18, 0)), Some(hm(19, 0))).unwrap();
        assert_eq!(task.to_string(), "Gym (18:00-19:00) (60 min) [PENDING]");
        task.set_done(true);
        assert_eq!(task.to_string(), "Gym (18:00-19:00) (60 min) [DONE]");
    }

    #[test]
    fn serde_keeps_identity_and_rejects_bad_ranges() {
        let task = Task::new("Plan", Some(hm(8, 0)), Some(hm(8, 30))).unwrap();
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, task);

        let bad = json.replace("08:30:00", "07:00:00");
        assert!(serde_json::from_str::<Task>(&bad).is_err());
    }

    proptest! {
        #[test]
        fn end_stays_after_start_under_any_edit(
            s1 in 0u32..1440, e1 in 0u32..1440,
            s2 in 0u32..1440, e2 in 0u32..1440,
        ) {
            let t = |m: u32| hm(m / 60, m % 60);
            if let Ok(mut task) = Task::new("p", Some(t(s1)), Some(t(e1))) {
                let before = task.clone();
                match task.set_times(Some(t(s2)), Some(t(e2))) {
                    Ok(()) => prop_assert!(task.end().unwrap() > task.start().unwrap()),
                    Err(_) => prop_assert_eq!(&task, &before),
                }
                let _ = task.set_start(Some(t(e2)));
                prop_assert!(task.end().unwrap() > task.start().unwrap());
            } else {
                prop_assert!(e1 <= s1);
            }
        }
    }
}
