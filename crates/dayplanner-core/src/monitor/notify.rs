//! Outbound notification boundary.
//!
//! Delivery (tray balloons, sounds, desktop toasts) happens elsewhere; the
//! core only hands over a kind, a title and a message.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Fire-and-forget receiver of notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Info => tracing::info!(title = %n.title, "{}", n.message),
            NotificationKind::Warning => tracing::warn!(title = %n.title, "{}", n.message),
            NotificationKind::Error => tracing::error!(title = %n.title, "{}", n.message),
        }
    }
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is listening any more.
        let _ = self.tx.send(notification);
    }
}

/// Drops everything except errors. Used when notifications are disabled.
#[derive(Debug, Clone)]
pub struct MutedSink<S> {
    inner: S,
}

impl<S: NotificationSink> MutedSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: NotificationSink> NotificationSink for MutedSink<S> {
    fn notify(&self, notification: Notification) {
        if notification.kind == NotificationKind::Error {
            self.inner.notify(notification);
        }
    }
}
