//! Command orchestration from reducer effects to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};
use shared::error::ApiError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

/// Queues every command. Commands that cannot be queued are answered with the
/// failure completion the reducer expects, so no request stays pending.
pub fn dispatch_backend_commands(
    cmd_tx: &Sender<BackendCommand>,
    commands: Vec<BackendCommand>,
) -> Vec<UiEvent> {
    let mut undelivered = Vec::new();
    for cmd in commands {
        let cmd_name = cmd.name();
        match cmd_tx.try_send(cmd) {
            Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
            Err(TrySendError::Full(cmd)) => {
                tracing::warn!(command = cmd_name, "backend command queue is full");
                undelivered.extend(undeliverable(cmd, "UI command queue is full; please retry"));
            }
            Err(TrySendError::Disconnected(cmd)) => {
                tracing::error!(command = cmd_name, "backend command processor disconnected");
                undelivered.extend(undeliverable(
                    cmd,
                    "Backend command processor disconnected; restart the shell",
                ));
            }
        }
    }
    undelivered
}

fn undeliverable(cmd: BackendCommand, reason: &str) -> Option<UiEvent> {
    let err = ApiError::connectivity(reason);
    match cmd {
        BackendCommand::Login { request, .. } => Some(UiEvent::LoginCompleted {
            request,
            result: Err(err),
        }),
        BackendCommand::Register { request, .. } => Some(UiEvent::RegisterCompleted {
            request,
            result: Err(err),
        }),
        BackendCommand::FetchFiles { request, .. } => Some(UiEvent::FilesLoaded {
            request,
            result: Err(err),
        }),
        BackendCommand::Transfer { role, request, .. } => Some(UiEvent::TransferCompleted {
            role,
            request,
            result: Err(err),
        }),
        BackendCommand::SaveDownload { request, name, .. } => Some(UiEvent::DownloadFailed {
            request,
            name,
            reason: reason.to_string(),
        }),
        BackendCommand::ScheduleNotificationExpiry { .. }
        | BackendCommand::CancelNotificationExpiry => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use shared::{
        domain::{NotificationId, RequestId},
        error::FailureKind,
    };
    use std::time::Duration;

    #[test]
    fn queues_commands_while_capacity_remains() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let failures = dispatch_backend_commands(
            &cmd_tx,
            vec![BackendCommand::FetchFiles {
                request: RequestId(1),
                username: "alice".to_string(),
            }],
        );
        assert!(failures.is_empty());
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(BackendCommand::FetchFiles { request: RequestId(1), .. })
        ));
    }

    #[test]
    fn full_queue_answers_requests_with_connectivity_failure() {
        let (cmd_tx, _cmd_rx) = bounded(1);
        let failures = dispatch_backend_commands(
            &cmd_tx,
            vec![
                BackendCommand::CancelNotificationExpiry,
                BackendCommand::Login {
                    request: RequestId(7),
                    username: "alice".to_string(),
                    password: "pw".to_string(),
                },
                BackendCommand::ScheduleNotificationExpiry {
                    id: NotificationId(1),
                    after: Duration::from_secs(3),
                },
            ],
        );

        assert_eq!(failures.len(), 1);
        match &failures[0] {
            UiEvent::LoginCompleted {
                request,
                result: Err(err),
            } => {
                assert_eq!(*request, RequestId(7));
                assert_eq!(err.kind, FailureKind::ConnectivityFailed);
            }
            other => panic!("unexpected event: {}", other.name()),
        }
    }

    #[test]
    fn disconnected_queue_fails_downloads() {
        let (cmd_tx, cmd_rx) = bounded(1);
        drop(cmd_rx);
        let failures = dispatch_backend_commands(
            &cmd_tx,
            vec![BackendCommand::SaveDownload {
                request: RequestId(11),
                name: "report.pdf.enc".to_string(),
                bytes: vec![1, 2, 3],
            }],
        );
        assert!(matches!(
            failures.as_slice(),
            [UiEvent::DownloadFailed { request: RequestId(11), name, .. }]
                if name == "report.pdf.enc"
        ));
    }
}
