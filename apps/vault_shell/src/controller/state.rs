//! Centrally owned client state. Mutated only by the reducer.

use std::{path::PathBuf, time::Duration};

use shared::domain::{FileRecord, RequestId, TransferRole};

use super::{notification::NotificationSlot, router::ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Login,
    Register,
    Dashboard,
}

/// Authenticated identity plus top-level page. The dashboard is shown exactly
/// when a username is present.
#[derive(Debug, Clone, Default)]
pub struct Session {
    username: Option<String>,
    page: Page,
}

impl Session {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub(crate) fn establish(&mut self, username: String) {
        self.username = Some(username);
        self.page = Page::Dashboard;
    }

    pub(crate) fn clear(&mut self) {
        self.username = None;
        self.page = Page::Login;
    }

    /// Switches between the unauthenticated pages. Returns false while signed in.
    pub(crate) fn show_unauthenticated(&mut self, page: Page) -> bool {
        if self.is_authenticated() || page == Page::Dashboard {
            return false;
        }
        self.page = page;
        true
    }
}

/// Loading flag and inline error for the login and register forms.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub error: Option<String>,
    pending: Option<RequestId>,
}

impl FormState {
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn begin(&mut self, request: RequestId) {
        self.pending = Some(request);
        self.error = None;
    }

    /// Ends the submission if `request` is the one being waited on.
    pub(crate) fn complete(&mut self, request: RequestId) -> bool {
        if self.pending == Some(request) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A local file picked for encryption or decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub name: String,
}

impl StagedFile {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        if name.is_empty() {
            return None;
        }
        Some(Self { path, name })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightTransfer {
    pub request: RequestId,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Idle,
    Staged,
    InFlight,
}

#[derive(Debug, Clone, Default)]
pub struct TransferSlot {
    pub staged: Option<StagedFile>,
    pub in_flight: Option<InFlightTransfer>,
}

impl TransferSlot {
    pub fn phase(&self) -> TransferPhase {
        match (&self.staged, &self.in_flight) {
            (_, Some(_)) => TransferPhase::InFlight,
            (Some(_), None) => TransferPhase::Staged,
            (None, None) => TransferPhase::Idle,
        }
    }

    pub fn can_trigger(&self) -> bool {
        self.phase() == TransferPhase::Staged
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileListing {
    pub records: Vec<FileRecord>,
    pub(crate) pending: Option<RequestId>,
}

impl FileListing {
    pub fn is_refreshing(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub session: Session,
    pub view: ViewState,
    pub login_form: FormState,
    pub register_form: FormState,
    pub encrypt: TransferSlot,
    pub decrypt: TransferSlot,
    /// Owner typed into the decrypt panel; independent of the signed-in user.
    pub decrypt_owner: String,
    pub files: FileListing,
    pub notifications: NotificationSlot,
    pub last_download: Option<PathBuf>,
    /// Saves still being written; completions for other ids are dropped.
    pub(crate) pending_downloads: Vec<RequestId>,
    pub status: Option<String>,
    next_request: u64,
}

impl AppState {
    pub fn new(notification_ttl: Duration) -> Self {
        Self {
            session: Session::default(),
            view: ViewState::default(),
            login_form: FormState::default(),
            register_form: FormState::default(),
            encrypt: TransferSlot::default(),
            decrypt: TransferSlot::default(),
            decrypt_owner: String::new(),
            files: FileListing::default(),
            notifications: NotificationSlot::new(notification_ttl),
            last_download: None,
            pending_downloads: Vec::new(),
            status: None,
            next_request: 1,
        }
    }

    pub fn slot(&self, role: TransferRole) -> &TransferSlot {
        match role {
            TransferRole::Encrypt => &self.encrypt,
            TransferRole::Decrypt => &self.decrypt,
        }
    }

    pub(crate) fn slot_mut(&mut self, role: TransferRole) -> &mut TransferSlot {
        match role {
            TransferRole::Encrypt => &mut self.encrypt,
            TransferRole::Decrypt => &mut self.decrypt,
        }
    }

    pub(crate) fn next_request_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(super::notification::DEFAULT_NOTIFICATION_TTL)
    }
}
