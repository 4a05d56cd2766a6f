//! Focus-session state machine and the manual focus signal.
//!
//! ```text
//!            any_active                     !any_active
//!   Idle ───────────────> Focused(since) ───────────────> Idle
//!                          │       ^
//!                          └───────┘  elapsed >= break interval:
//!                                     break cue, since = now
//! ```

use std::sync::{Arc, RwLock};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::events::MonitorEvent;
use crate::storage::MonitorConfig;

/// Snapshot of the external start/stop focus control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualFocusState {
    pub active: bool,
    pub started_at: Option<NaiveDateTime>,
}

/// Read-only view of the manual focus control.
pub trait FocusSignal: Send + Sync {
    fn current(&self) -> ManualFocusState;
}

/// Shared manual focus control. The UI flips it; the monitor only reads it.
#[derive(Debug, Clone, Default)]
pub struct ManualFocus {
    state: Arc<RwLock<ManualFocusState>>,
}

impl ManualFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, at: NaiveDateTime) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = ManualFocusState {
            active: true,
            started_at: Some(at),
        };
        tracing::info!(%at, "manual focus started");
    }

    pub fn stop(&self) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = ManualFocusState::default();
        tracing::info!("manual focus stopped");
    }
}

impl FocusSignal for ManualFocus {
    fn current(&self) -> ManualFocusState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Signal that is never active.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoManualFocus;

impl FocusSignal for NoManualFocus {
    fn current(&self) -> ManualFocusState {
        ManualFocusState::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FocusState {
    Idle,
    Focused { since: NaiveDateTime },
}

/// Focus session plus its two one-shot flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusSession {
    state: FocusState,
    warning_sent: bool,
    relaxation_sent: bool,
}

impl Default for FocusSession {
    fn default() -> Self {
        Self {
            state: FocusState::Idle,
            warning_sent: false,
            relaxation_sent: false,
        }
    }
}

impl FocusSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Start of the current session (moves forward at every break cue).
    pub fn anchor(&self) -> Option<NaiveDateTime> {
        match self.state {
            FocusState::Idle => None,
            FocusState::Focused { since } => Some(since),
        }
    }

    pub fn warning_sent(&self) -> bool {
        self.warning_sent
    }

    pub fn relaxation_sent(&self) -> bool {
        self.relaxation_sent
    }

    /// Advance the machine by one poll.
    ///
    /// `anchor_hint` is where a newly opened session should start (the
    /// manual-focus start time); `now` is used when it is `None`. It has no
    /// effect on a session that is already open.
    pub fn step(
        &mut self,
        any_active: bool,
        anchor_hint: Option<NaiveDateTime>,
        now: NaiveDateTime,
        config: &MonitorConfig,
    ) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        if !any_active {
            if let FocusState::Focused { since } = self.state {
                events.push(MonitorEvent::FocusEnded { since, at: now });
                *self = Self::default();
            }
            return events;
        }

        let since = match self.state {
            FocusState::Focused { since } => since,
            FocusState::Idle => {
                let since = anchor_hint.unwrap_or(now);
                self.state = FocusState::Focused { since };
                events.push(MonitorEvent::FocusStarted { since, at: now });
                since
            }
        };

        let elapsed = now - since;
        let (warning, interval) = (config.break_warning(), config.break_interval());

        if !self.warning_sent && elapsed >= warning && elapsed < interval {
            events.push(MonitorEvent::ApproachingBreak {
                focused_minutes: elapsed.num_minutes(),
                break_in_minutes: (interval - elapsed).num_minutes().max(1),
                at: now,
            });
            self.warning_sent = true;
        }

        if !self.relaxation_sent && elapsed >= interval {
            events.push(MonitorEvent::RelaxationPrompt {
                focused_minutes: elapsed.num_minutes(),
                at: now,
            });
            self.relaxation_sent = true;
        }

        if elapsed >= interval {
            events.push(MonitorEvent::BreakTime {
                focused_minutes: elapsed.num_minutes(),
                at: now,
            });
            // Stay focused: the next hour of continuous work gets its own cues.
            self.state = FocusState::Focused { since: now };
            self.warning_sent = false;
            self.relaxation_sent = false;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn names(events: &[MonitorEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                MonitorEvent::FocusStarted { .. } => "started",
                MonitorEvent::ApproachingBreak { .. } => "warning",
                MonitorEvent::RelaxationPrompt { .. } => "relax",
                MonitorEvent::BreakTime { .. } => "break",
                MonitorEvent::FocusEnded { .. } => "ended",
                _ => "other",
            })
            .collect()
    }

    #[test]
    fn idle_stays_idle_without_activity() {
        let mut session = FocusSession::new();
        let events = session.step(false, None, t0(), &MonitorConfig::default());
        assert!(events.is_empty());
        assert_eq!(session.state(), FocusState::Idle);
    }

    #[test]
    fn activity_opens_session_at_now() {
        let mut session = FocusSession::new();
        let events = session.step(true, None, t0(), &MonitorConfig::default());
        assert_eq!(names(&events), ["started"]);
        assert_eq!(session.anchor(), Some(t0()));
    }

    #[test]
    fn anchor_hint_only_applies_when_opening() {
        let cfg = MonitorConfig::default();
        let mut session = FocusSession::new();
        let manual = t0() - Duration::minutes(10);
        session.step(true, Some(manual), t0(), &cfg);
        assert_eq!(session.anchor(), Some(manual));

        session.step(true, Some(t0()), t0() + Duration::minutes(1), &cfg);
        assert_eq!(session.anchor(), Some(manual));
    }

    #[test]
    fn warning_then_break_then_reset_in_place() {
        let cfg = MonitorConfig::default();
        let mut session = FocusSession::new();
        session.step(true, None, t0(), &cfg);

        let events = session.step(true, None, t0() + Duration::minutes(55), &cfg);
        assert_eq!(names(&events), ["warning"]);
        assert!(session.warning_sent());

        let events = session.step(true, None, t0() + Duration::minutes(57), &cfg);
        assert!(events.is_empty());

        let at_hour = t0() + Duration::minutes(60);
        let events = session.step(true, None, at_hour, &cfg);
        assert_eq!(names(&events), ["relax", "break"]);
        assert_eq!(session.state(), FocusState::Focused { since: at_hour });
        assert!(!session.warning_sent());
        assert!(!session.relaxation_sent());
    }

    #[test]
    fn late_poll_past_the_hour_skips_the_warning() {
        let cfg = MonitorConfig::default();
        let mut session = FocusSession::new();
        let events = session.step(true, Some(t0() - Duration::minutes(90)), t0(), &cfg);
        // Opened 90 minutes ago: straight to the break cue.
        assert_eq!(names(&events), ["started", "relax", "break"]);
        assert_eq!(session.anchor(), Some(t0()));
    }

    #[test]
    fn inactivity_ends_session_and_clears_flags() {
        let cfg = MonitorConfig::default();
        let mut session = FocusSession::new();
        session.step(true, None, t0(), &cfg);
        session.step(true, None, t0() + Duration::minutes(56), &cfg);

        let events = session.step(false, None, t0() + Duration::minutes(58), &cfg);
        assert_eq!(names(&events), ["ended"]);
        assert_eq!(session, FocusSession::new());
    }

    #[test]
    fn manual_focus_control_is_shared() {
        let control = ManualFocus::new();
        let view: Arc<dyn FocusSignal> = Arc::new(control.clone());
        assert!(!view.current().active);

        control.start(t0());
        assert_eq!(
            view.current(),
            ManualFocusState {
                active: true,
                started_at: Some(t0())
            }
        );

        control.stop();
        assert_eq!(view.current(), ManualFocusState::default());
        assert!(!NoManualFocus.current().active);
    }
}
