//! Reminder/focus monitor.
//!
//! A single background task polls today's schedule on a fixed cadence and
//! turns what it sees into [`MonitorEvent`](crate::events::MonitorEvent)s:
//!
//! - "starting soon" / "ending soon" reminders, at most once per task per day
//! - focus-session tracking with a warning before the hourly break cue
//!
//! Each cycle goes through [`ReminderMonitor::poll`], which only reads the
//! injected clock, schedule and manual-focus signal. Tests drive it directly
//! with a [`ManualClock`](crate::clock::ManualClock); production code calls
//! [`ReminderMonitor::spawn`].

mod focus;
mod notify;
mod reminder;

pub use focus::{FocusSession, FocusSignal, FocusState, ManualFocus, ManualFocusState, NoManualFocus};
pub use notify::{ChannelSink, MutedSink, Notification, NotificationKind, NotificationSink, TracingSink};
pub use reminder::{MonitorHandle, ReminderMonitor};
