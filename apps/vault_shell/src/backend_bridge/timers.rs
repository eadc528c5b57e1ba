//! Cancellable expiry timer for the notification slot.

use std::time::Duration;

use crossbeam_channel::Sender;
use shared::domain::NotificationId;
use tokio::task::JoinHandle;

use crate::controller::events::UiEvent;

/// Owns the single pending expiry. Scheduling a new one aborts the previous
/// task, so a replaced notification's timer can never fire.
pub struct NotificationTimer {
    ui_tx: Sender<UiEvent>,
    pending: Option<(NotificationId, JoinHandle<()>)>,
}

impl NotificationTimer {
    pub fn new(ui_tx: Sender<UiEvent>) -> Self {
        Self {
            ui_tx,
            pending: None,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, id: NotificationId, after: Duration) {
        self.cancel();
        let ui_tx = self.ui_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = ui_tx.try_send(UiEvent::NotificationExpired(id));
        });
        self.pending = Some((id, task));
    }

    pub fn cancel(&mut self) {
        if let Some((id, task)) = self.pending.take() {
            task.abort();
            tracing::trace!(%id, "notification expiry cancelled");
        }
    }

    pub fn pending(&self) -> Option<NotificationId> {
        self.pending.as_ref().map(|(id, _)| *id)
    }
}

impl Drop for NotificationTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
