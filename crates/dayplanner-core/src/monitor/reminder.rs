//! Reminder monitor loop.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::focus::{FocusSession, FocusSignal, NoManualFocus};
use super::notify::NotificationSink;
use crate::clock::Clock;
use crate::error::{ConfigError, StoreError};
use crate::events::MonitorEvent;
use crate::storage::{sorted_by_start, MonitorConfig, ScheduleSource};
use crate::task::TaskId;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Reminders already sent, scoped to one day.
#[derive(Debug, Default)]
struct ReminderLedger {
    day: Option<NaiveDate>,
    starts: HashSet<TaskId>,
    ends: HashSet<TaskId>,
}

impl ReminderLedger {
    fn roll_to(&mut self, today: NaiveDate) {
        if self.day != Some(today) {
            if self.day.is_some() {
                debug!(%today, "day rolled over; reminder ledger cleared");
            }
            self.starts.clear();
            self.ends.clear();
            self.day = Some(today);
        }
    }
}

/// Polls today's schedule and emits reminders and focus-session events.
///
/// The monitor owns its bookkeeping outright; nothing else can see or
/// change which reminders have been sent or where the focus session began.
pub struct ReminderMonitor {
    config: MonitorConfig,
    source: Arc<dyn ScheduleSource>,
    clock: Arc<dyn Clock>,
    focus: Arc<dyn FocusSignal>,
    sink: Arc<dyn NotificationSink>,
    events: broadcast::Sender<MonitorEvent>,
    ledger: ReminderLedger,
    session: FocusSession,
}

impl ReminderMonitor {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `config` fails
    /// [`MonitorConfig::validate`]: a zero poll interval would spin and a
    /// zero break interval would cue a break on every poll.
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn ScheduleSource>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            source,
            clock,
            focus: Arc::new(NoManualFocus),
            sink,
            events,
            ledger: ReminderLedger::default(),
            session: FocusSession::new(),
        })
    }

    pub fn with_focus_signal(mut self, focus: Arc<dyn FocusSignal>) -> Self {
        self.focus = focus;
        self
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &FocusSession {
        &self.session
    }

    /// Compute one cycle without dispatching anything.
    ///
    /// On a read failure nothing in the monitor's state changes.
    pub fn poll(&mut self) -> Result<Vec<MonitorEvent>, StoreError> {
        let now = self.clock.now();
        let today = now.date();
        let tasks = self.source.tasks_for(today)?;
        self.ledger.roll_to(today);

        let lead = self.config.reminder_lead();
        let mut events = Vec::new();
        let mut any_active = false;

        let pending = sorted_by_start(
            tasks
                .into_iter()
                .filter(|t| !t.is_done() && t.start().is_some())
                .collect(),
        );

        for task in &pending {
            let Some(start) = task.start().map(|s| today.and_time(s)) else {
                continue;
            };
            let end = task.effective_end().map(|e| today.and_time(e));

            if !self.ledger.starts.contains(&task.id()) && now >= start - lead && now < start {
                events.push(MonitorEvent::StartingSoon {
                    task_id: task.id(),
                    title: task.title().to_string(),
                    starts_at: start.time(),
                    in_minutes: minutes_until(now, start),
                    at: now,
                });
                self.ledger.starts.insert(task.id());
            }

            let Some(end) = end else {
                continue;
            };

            if !self.ledger.ends.contains(&task.id()) && now >= end - lead && now < end {
                events.push(MonitorEvent::EndingSoon {
                    task_id: task.id(),
                    title: task.title().to_string(),
                    ends_at: end.time(),
                    in_minutes: minutes_until(now, end),
                    at: now,
                });
                self.ledger.ends.insert(task.id());
            }

            if now >= start && now < end {
                any_active = true;
            }
        }

        let manual = self.focus.current();
        let anchor_hint = if manual.active {
            any_active = true;
            Some(manual.started_at.unwrap_or(now))
        } else {
            None
        };

        events.extend(self.session.step(any_active, anchor_hint, now, &self.config));
        Ok(events)
    }

    /// Run one cycle and dispatch its events. Failures become a
    /// [`MonitorEvent::CycleFailed`] diagnostic instead of an error.
    pub fn run_cycle(&mut self) -> Vec<MonitorEvent> {
        let events = match self.poll() {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, "reminder cycle skipped");
                vec![MonitorEvent::CycleFailed {
                    message: err.to_string(),
                    at: self.clock.now(),
                }]
            }
        };

        for event in &events {
            debug!(?event, "monitor event");
            if let Some(notification) = event.notification() {
                self.sink.notify(notification);
            }
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
        events
    }

    /// Move the monitor onto a background task.
    ///
    /// The loop checks `cancel` before every cycle and while sleeping, so
    /// cancelling stops it promptly and without further events.
    #[must_use]
    pub fn spawn(mut self, cancel: CancellationToken) -> MonitorHandle {
        let events = self.events.clone();
        let interval = self.config.poll_interval();
        let token = cancel.clone();

        let join = tokio::spawn(
            async move {
                info!(poll_secs = interval.as_secs(), "reminder monitor started");
                loop {
                    if token.is_cancelled() {
                        break;
                    }
                    self.run_cycle();
                    tokio::select! {
                        biased;
                        () = token.cancelled() => break,
                        () = tokio::time::sleep(interval) => {}
                    }
                }
                info!("reminder monitor stopped");
            }
            .instrument(info_span!("reminder_monitor")),
        );

        MonitorHandle {
            cancel,
            join: Some(join),
            events,
        }
    }
}

/// Owner's handle to a spawned [`ReminderMonitor`]. Dropping it cancels the
/// monitor.
pub struct MonitorHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
    events: broadcast::Sender<MonitorEvent>,
}

impl MonitorHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                warn!(error = %err, "reminder monitor task ended abnormally");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn minutes_until(now: NaiveDateTime, then: NaiveDateTime) -> i64 {
    let secs = (then - now).num_seconds().max(0);
    (secs + 59) / 60
}
