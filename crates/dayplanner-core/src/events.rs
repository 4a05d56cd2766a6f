use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::monitor::{Notification, NotificationKind};
use crate::task::TaskId;

/// Everything the reminder monitor reports.
/// Subscribers (GUI, CLI) receive every event; the notification sink only
/// receives the ones that map to a user-facing [`Notification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MonitorEvent {
    StartingSoon {
        task_id: TaskId,
        title: String,
        starts_at: NaiveTime,
        in_minutes: i64,
        at: NaiveDateTime,
    },
    EndingSoon {
        task_id: TaskId,
        title: String,
        ends_at: NaiveTime,
        in_minutes: i64,
        at: NaiveDateTime,
    },
    /// A focus session opened (task in progress or manual focus).
    FocusStarted {
        since: NaiveDateTime,
        at: NaiveDateTime,
    },
    ApproachingBreak {
        focused_minutes: i64,
        break_in_minutes: i64,
        at: NaiveDateTime,
    },
    /// The GUI should offer the guided relaxation flow.
    RelaxationPrompt {
        focused_minutes: i64,
        at: NaiveDateTime,
    },
    /// Break cue; the session stays open and its anchor moves to `at`.
    BreakTime {
        focused_minutes: i64,
        at: NaiveDateTime,
    },
    FocusEnded {
        since: NaiveDateTime,
        at: NaiveDateTime,
    },
    /// A poll cycle was skipped.
    CycleFailed {
        message: String,
        at: NaiveDateTime,
    },
}

impl MonitorEvent {
    pub fn at(&self) -> NaiveDateTime {
        match self {
            MonitorEvent::StartingSoon { at, .. }
            | MonitorEvent::EndingSoon { at, .. }
            | MonitorEvent::FocusStarted { at, .. }
            | MonitorEvent::ApproachingBreak { at, .. }
            | MonitorEvent::RelaxationPrompt { at, .. }
            | MonitorEvent::BreakTime { at, .. }
            | MonitorEvent::FocusEnded { at, .. }
            | MonitorEvent::CycleFailed { at, .. } => *at,
        }
    }

    /// User-facing notification for this event, if it has one.
    pub fn notification(&self) -> Option<Notification> {
        let (kind, title, message) = match self {
            MonitorEvent::StartingSoon {
                title, in_minutes, ..
            } => (
                NotificationKind::Info,
                "Task Reminder",
                format!("Task starting in {in_minutes} minutes: {title}"),
            ),
            MonitorEvent::EndingSoon {
                title, in_minutes, ..
            } => (
                NotificationKind::Info,
                "Upcoming Task End",
                format!("Task ending in {in_minutes} minutes: {title}. Consider a short break."),
            ),
            MonitorEvent::ApproachingBreak {
                focused_minutes,
                break_in_minutes,
                ..
            } => (
                NotificationKind::Info,
                "Upcoming Break",
                format!(
                    "You've been focused for {focused_minutes} minutes. Break in {break_in_minutes} minutes."
                ),
            ),
            MonitorEvent::RelaxationPrompt { .. } => (
                NotificationKind::Info,
                "Relaxation",
                "Take a 5-minute break to relax? Hydrate, breathe, stretch, refocus.".to_string(),
            ),
            MonitorEvent::BreakTime {
                focused_minutes, ..
            } => (
                NotificationKind::Warning,
                "Break Time",
                format!("You've been focused for {focused_minutes} minutes. Take a 5-minute break!"),
            ),
            MonitorEvent::CycleFailed { message, .. } => (
                NotificationKind::Error,
                "Reminder Monitor",
                format!("Reminder check skipped: {message}"),
            ),
            MonitorEvent::FocusStarted { .. } | MonitorEvent::FocusEnded { .. } => return None,
        };
        Some(Notification {
            kind,
            title: title.to_string(),
            message,
        })
    }
}
