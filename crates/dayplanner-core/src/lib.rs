//! # Dayplanner Core Library
//!
//! This library provides the core logic for a single-user day planner: a
//! dated task schedule, conflict-free slot placement inside a work day, and a
//! background monitor that issues task reminders and hourly break cues.
//! The `dayplanner` CLI binary and any GUI sit on top of the same library.
//!
//! ## Architecture
//!
//! - **Task model**: validated tasks with optional start/end times
//! - **Storage**: in-memory per-day schedule store with a JSON snapshot, and
//!   TOML-based configuration
//! - **Placement**: overlap checks and earliest-fit slot search
//! - **Monitor**: cancellable polling loop driven by an injected clock
//!
//! ## Key Components
//!
//! - [`Task`]: One schedule entry
//! - [`ScheduleStore`]: Tasks keyed by date, safe for concurrent use
//! - [`PlacementEngine`]: Overlap detection and next-slot search
//! - [`ReminderMonitor`]: Reminder and focus-session loop
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod monitor;
pub mod placement;
pub mod stats;
pub mod storage;
pub mod task;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::MonitorEvent;
pub use monitor::{
    ChannelSink, FocusSession, FocusState, ManualFocus, MonitorHandle, MutedSink, Notification,
    NotificationKind, NotificationSink, ReminderMonitor, TracingSink,
};
pub use placement::{Placement, PlacementEngine, WorkDay};
pub use stats::{CounterDelta, MonthCounts, MonthlyStats, StatsSink};
pub use storage::{Config, DayProgress, ScheduleSource, ScheduleStore};
pub use task::{Task, TaskId, TaskView};
