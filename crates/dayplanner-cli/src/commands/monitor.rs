use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Subcommand;
use dayplanner_core::clock::{Clock, SystemClock};
use dayplanner_core::storage::{self, Config, ScheduleSource, ScheduleStore};
use dayplanner_core::{
    ManualFocus, MutedSink, NotificationSink, ReminderMonitor, StoreError, Task, TracingSink,
};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

#[derive(Subcommand)]
pub enum MonitorAction {
    /// Watch today's schedule until interrupted
    Run {
        /// Start a manual focus session now
        #[arg(long)]
        focus: bool,
        /// Run a single cycle and print its events
        #[arg(long)]
        once: bool,
    },
}

/// Re-reads the snapshot file on every poll so edits made by other
/// `dayplanner` invocations show up without a restart.
struct SnapshotSource {
    path: PathBuf,
}

impl ScheduleSource for SnapshotSource {
    fn tasks_for(&self, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let store = ScheduleStore::load_from(&self.path)
            .map_err(|e| StoreError::TransientReadFailure(e.to_string()))?;
        Ok(store.get_tasks(date))
    }
}

pub fn run(action: MonitorAction) -> Result<(), Box<dyn Error>> {
    match action {
        MonitorAction::Run { focus, once } => run_monitor(focus, once),
    }
}

fn run_monitor(start_focus: bool, once: bool) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let source = Arc::new(SnapshotSource {
        path: storage::schedule_path()?,
    });
    let sink: Arc<dyn NotificationSink> = if config.notifications.enabled {
        Arc::new(TracingSink)
    } else {
        Arc::new(MutedSink::new(TracingSink))
    };

    let focus = ManualFocus::new();
    if start_focus {
        focus.start(SystemClock.now());
    }
    let mut monitor = ReminderMonitor::new(config.monitor.clone(), source, Arc::new(SystemClock), sink)?
        .with_focus_signal(Arc::new(focus));

    if once {
        let events = monitor.run_cycle();
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let handle = monitor.spawn(CancellationToken::new());
        let mut events = handle.subscribe();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("interrupted, stopping monitor");
                    break;
                }
                received = events.recv() => match received {
                    Ok(event) => println!("{}", serde_json::to_string(&event)?),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event output fell behind");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        handle.shutdown().await;
        Ok::<(), Box<dyn Error>>(())
    })
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}
