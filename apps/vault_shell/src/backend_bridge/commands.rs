//! Backend commands queued from the reducer to the backend worker.

use std::time::Duration;

use shared::domain::{NotificationId, RequestId, TransferRole};

use crate::controller::state::StagedFile;

pub enum BackendCommand {
    Login {
        request: RequestId,
        username: String,
        password: String,
    },
    Register {
        request: RequestId,
        username: String,
        password: String,
    },
    FetchFiles {
        request: RequestId,
        username: String,
    },
    Transfer {
        role: TransferRole,
        request: RequestId,
        username: String,
        file: StagedFile,
    },
    SaveDownload {
        request: RequestId,
        name: String,
        bytes: Vec<u8>,
    },
    ScheduleNotificationExpiry {
        id: NotificationId,
        after: Duration,
    },
    CancelNotificationExpiry,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Register { .. } => "register",
            Self::FetchFiles { .. } => "fetch_files",
            Self::Transfer {
                role: TransferRole::Encrypt,
                ..
            } => "encrypt",
            Self::Transfer {
                role: TransferRole::Decrypt,
                ..
            } => "decrypt",
            Self::SaveDownload { .. } => "save_download",
            Self::ScheduleNotificationExpiry { .. } => "schedule_notification_expiry",
            Self::CancelNotificationExpiry => "cancel_notification_expiry",
        }
    }
}
