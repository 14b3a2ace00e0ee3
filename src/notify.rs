//! User-facing notifications.
//!
//! Screens never display anything themselves; they report through a
//! [`Notifier`] handed to them. [`NotificationQueue`] keeps a bounded FIFO of
//! transient messages for a presentation layer to poll, [`TracingNotifier`]
//! just logs.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    /// How long a message of this level stays up by default.
    pub fn default_duration(&self) -> Duration {
        match self {
            Level::Success | Level::Info => Duration::from_millis(3000),
            Level::Warning => Duration::from_millis(4000),
            Level::Error => Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub message: String,
    /// `None` keeps the message until dismissed.
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            duration: Some(level.default_duration()),
        }
    }

    pub fn persistent(level: Level, message: impl Into<String>) -> Self {
        Self {
            duration: None,
            ..Self::new(level, message)
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::new(Level::Success, message));
    }

    fn info(&self, message: &str) {
        self.notify(Notification::new(Level::Info, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Notification::new(Level::Warning, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::new(Level::Error, message));
    }
}

/// Logs every notification through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success | Level::Info => tracing::info!("{}", notification.message),
            Level::Warning => tracing::warn!("{}", notification.message),
            Level::Error => tracing::error!("{}", notification.message),
        }
    }
}

struct Queued {
    notification: Notification,
    posted_at: Instant,
}

impl Queued {
    fn expired(&self, now: Instant) -> bool {
        self.notification
            .duration
            .map(|d| now.duration_since(self.posted_at) >= d)
            .unwrap_or(false)
    }
}

/// Bounded FIFO of notifications.
///
/// When full, the oldest message is dropped to make room. Messages expire
/// after their duration; persistent ones stay until dismissed.
pub struct NotificationQueue {
    capacity: usize,
    entries: Mutex<VecDeque<Queued>>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Messages still visible at `now`, oldest first. Expired ones are pruned.
    pub fn active_at(&self, now: Instant) -> Vec<Notification> {
        let mut entries = self.lock();
        entries.retain(|q| !q.expired(now));
        entries.iter().map(|q| q.notification.clone()).collect()
    }

    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now())
    }

    /// Every queued message regardless of expiry, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().iter().map(|q| q.notification.clone()).collect()
    }

    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|q| q.notification.id != id);
        entries.len() != before
    }

    pub fn dismiss_all(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Queued>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Notifier for NotificationQueue {
    fn notify(&self, notification: Notification) {
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(Queued {
            notification,
            posted_at: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        assert_eq!(Notification::new(Level::Success, "ok").duration, Some(Duration::from_secs(3)));
        assert_eq!(Notification::new(Level::Warning, "hm").duration, Some(Duration::from_secs(4)));
        assert_eq!(Notification::new(Level::Error, "no").duration, Some(Duration::from_secs(5)));
        assert_eq!(Notification::persistent(Level::Info, "pinned").duration, None);
    }

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let queue = NotificationQueue::new(2);
        queue.info("first");
        queue.info("second");
        queue.error("third");

        let messages: Vec<String> = queue.snapshot().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["second", "third"]);
    }

    #[test]
    fn test_queue_expires_by_duration() {
        let queue = NotificationQueue::new(5);
        queue.success("saved");
        queue.notify(Notification::persistent(Level::Error, "backend down"));

        let later = Instant::now() + Duration::from_secs(10);
        let active = queue.active_at(later);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "backend down");
    }

    #[test]
    fn test_dismiss() {
        let queue = NotificationQueue::default();
        queue.warning("careful");
        let id = queue.snapshot()[0].id;

        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        assert!(queue.is_empty());
    }
}
