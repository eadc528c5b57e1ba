//! User intents and backend completions fed to the reducer.

use std::path::PathBuf;

use shared::{
    domain::{FileRecord, NotificationId, RequestId, TransferRole},
    error::ApiError,
};

use super::router::DashboardView;

pub enum UserAction {
    ShowLogin,
    ShowRegister,
    SubmitLogin {
        username: String,
        password: String,
    },
    SubmitRegister {
        username: String,
        password: String,
        confirm_password: String,
    },
    Logout,
    Navigate(DashboardView),
    NavigateFromMenu(DashboardView),
    OpenMobileMenu,
    CloseMobileMenu,
    StageFile {
        role: TransferRole,
        path: PathBuf,
    },
    ClearStagedFile {
        role: TransferRole,
    },
    SetDecryptOwner(String),
    TriggerTransfer {
        role: TransferRole,
    },
    RefreshFiles,
    DismissNotification,
}

pub enum UiEvent {
    Info(String),
    LoginCompleted {
        request: RequestId,
        result: Result<String, ApiError>,
    },
    RegisterCompleted {
        request: RequestId,
        result: Result<Option<String>, ApiError>,
    },
    FilesLoaded {
        request: RequestId,
        result: Result<Vec<FileRecord>, ApiError>,
    },
    TransferCompleted {
        role: TransferRole,
        request: RequestId,
        result: Result<Vec<u8>, ApiError>,
    },
    DownloadSaved {
        request: RequestId,
        name: String,
        path: PathBuf,
    },
    DownloadFailed {
        request: RequestId,
        name: String,
        reason: String,
    },
    NotificationExpired(NotificationId),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info(_) => "info",
            Self::LoginCompleted { .. } => "login_completed",
            Self::RegisterCompleted { .. } => "register_completed",
            Self::FilesLoaded { .. } => "files_loaded",
            Self::TransferCompleted { .. } => "transfer_completed",
            Self::DownloadSaved { .. } => "download_saved",
            Self::DownloadFailed { .. } => "download_failed",
            Self::NotificationExpired(_) => "notification_expired",
        }
    }
}
