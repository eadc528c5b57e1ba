//! Single-slot, self-expiring user feedback.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use shared::domain::NotificationId;

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: DateTime<Utc>,
}

/// Holds at most one notification. Each entry has its own id so an expiry
/// scheduled for a replaced entry can be recognised and ignored.
#[derive(Debug, Clone)]
pub struct NotificationSlot {
    current: Option<Notification>,
    next_id: u64,
    ttl: Duration,
}

impl NotificationSlot {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: None,
            next_id: 1,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) -> NotificationId {
        self.notify_at(message, kind, Utc::now())
    }

    pub fn notify_at(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.current = Some(Notification {
            id,
            message: message.into(),
            kind,
            expires_at,
        });
        id
    }

    /// Clears the slot only if `id` is still the visible entry.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        if self.current.as_ref().is_some_and(|current| current.id == id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn dismiss(&mut self) -> Option<NotificationId> {
        self.current.take().map(|notification| notification.id)
    }
}

impl Default for NotificationSlot {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}
