//! Pure state transitions. Each call mutates `AppState` and returns the
//! backend commands the transition requires; no I/O happens here.

use shared::{
    domain::{RequestId, TransferRole},
    error::{ApiError, FailureKind},
};
use tracing::{debug, info, warn};

use crate::backend_bridge::commands::BackendCommand;

use super::{
    events::{UiEvent, UserAction},
    notification::NotificationKind,
    state::{AppState, InFlightTransfer, Page, StagedFile},
};

pub const CONNECTION_FAILED: &str = "Connection failed. Please check if the server is running.";
const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const MISSING_CREDENTIALS: &str = "Username and password are required";
const PASSWORD_MISMATCH: &str = "Passwords do not match";

pub fn apply_action(state: &mut AppState, action: UserAction) -> Vec<BackendCommand> {
    let mut effects = Vec::new();
    match action {
        UserAction::ShowLogin => show_page(state, Page::Login),
        UserAction::ShowRegister => show_page(state, Page::Register),
        UserAction::SubmitLogin { username, password } => {
            submit_login(state, &mut effects, username, password)
        }
        UserAction::SubmitRegister {
            username,
            password,
            confirm_password,
        } => submit_register(state, &mut effects, username, password, confirm_password),
        UserAction::Logout => {
            if state.session.is_authenticated() {
                logout(state, &mut effects);
            }
        }
        UserAction::Navigate(view) => {
            if state.session.is_authenticated() {
                state.view.navigate(view);
            }
        }
        UserAction::NavigateFromMenu(view) => {
            if state.session.is_authenticated() {
                state.view.navigate_from_menu(view);
            }
        }
        UserAction::OpenMobileMenu => {
            if state.session.is_authenticated() {
                state.view.open_menu();
            }
        }
        UserAction::CloseMobileMenu => state.view.close_menu(),
        UserAction::StageFile { role, path } => {
            stage_file(state, &mut effects, role, StagedFile::from_path(path))
        }
        UserAction::ClearStagedFile { role } => {
            let slot = state.slot_mut(role);
            if slot.in_flight.is_none() {
                slot.staged = None;
            }
        }
        UserAction::SetDecryptOwner(owner) => {
            if state.session.is_authenticated() {
                state.decrypt_owner = owner;
            }
        }
        UserAction::TriggerTransfer { role } => trigger_transfer(state, &mut effects, role),
        UserAction::RefreshFiles => {
            if let Some(username) = state.session.username().map(str::to_string) {
                refresh_files(state, &mut effects, username);
            }
        }
        UserAction::DismissNotification => {
            if state.notifications.dismiss().is_some() {
                effects.push(BackendCommand::CancelNotificationExpiry);
            }
        }
    }
    effects
}

pub fn apply_event(state: &mut AppState, event: UiEvent) -> Vec<BackendCommand> {
    let mut effects = Vec::new();
    match event {
        UiEvent::Info(message) => state.status = Some(message),
        UiEvent::LoginCompleted { request, result } => {
            login_completed(state, &mut effects, request, result)
        }
        UiEvent::RegisterCompleted { request, result } => {
            register_completed(state, &mut effects, request, result)
        }
        UiEvent::FilesLoaded { request, result } => {
            if state.files.pending != Some(request) {
                debug!(%request, "discarding stale file listing");
                return effects;
            }
            state.files.pending = None;
            match result {
                Ok(records) => state.files.records = records,
                Err(err) => {
                    warn!(kind = err.kind.as_str(), "file listing refresh failed");
                    notify(
                        state,
                        &mut effects,
                        "Failed to fetch files",
                        NotificationKind::Error,
                    );
                }
            }
        }
        UiEvent::TransferCompleted {
            role,
            request,
            result,
        } => transfer_completed(state, &mut effects, role, request, result),
        UiEvent::DownloadSaved {
            request,
            name,
            path,
        } => {
            if !finish_download(state, request) {
                return effects;
            }
            info!(file = %name, path = %path.display(), "download saved");
            state.last_download = Some(path);
        }
        UiEvent::DownloadFailed {
            request,
            name,
            reason,
        } => {
            if !finish_download(state, request) {
                return effects;
            }
            notify(
                state,
                &mut effects,
                format!("Could not save {name}: {reason}"),
                NotificationKind::Error,
            );
        }
        UiEvent::NotificationExpired(id) => {
            if !state.notifications.expire(id) {
                debug!(%id, "ignoring expiry for replaced notification");
            }
        }
    }
    effects
}

/// Removes `request` from the pending saves. False when it was not pending.
fn finish_download(state: &mut AppState, request: RequestId) -> bool {
    match state
        .pending_downloads
        .iter()
        .position(|pending| *pending == request)
    {
        Some(index) => {
            state.pending_downloads.swap_remove(index);
            true
        }
        None => {
            debug!(%request, "discarding stale download result");
            false
        }
    }
}

fn notify(
    state: &mut AppState,
    effects: &mut Vec<BackendCommand>,
    message: impl Into<String>,
    kind: NotificationKind,
) {
    let id = state.notifications.notify(message, kind);
    effects.push(BackendCommand::ScheduleNotificationExpiry {
        id,
        after: state.notifications.ttl(),
    });
}

fn form_error(err: &ApiError, fallback: &str) -> String {
    match err.kind {
        FailureKind::ConnectivityFailed => CONNECTION_FAILED.to_string(),
        FailureKind::ValidationFailed | FailureKind::RemoteRejected => err.user_message(fallback),
    }
}

fn show_page(state: &mut AppState, page: Page) {
    if state.session.show_unauthenticated(page) {
        state.login_form.error = None;
        state.register_form.error = None;
    }
}

fn submit_login(
    state: &mut AppState,
    effects: &mut Vec<BackendCommand>,
    username: String,
    password: String,
) {
    if state.session.page() != Page::Login {
        return;
    }
    if state.login_form.is_loading() {
        debug!("login already in progress; ignoring submission");
        return;
    }
    if username.trim().is_empty() || password.trim().is_empty() {
        state.login_form.error = Some(MISSING_CREDENTIALS.to_string());
        return;
    }

    let request = state.next_request_id();
    state.login_form.begin(request);
    effects.push(BackendCommand::Login {
        request,
        username,
        password,
    });
}

fn login_completed(
    state: &mut AppState,
    effects: &mut Vec<BackendCommand>,
    request: RequestId,
    result: Result<String, ApiError>,
) {
    if !state.login_form.complete(request) {
        debug!(%request, "discarding stale login response");
        return;
    }

    match result {
        Ok(username) => {
            info!(user = %username, "session established");
            state.session.establish(username.clone());
            state.view.reset();
            state.login_form.reset();
            refresh_files(state, effects, username);
            notify(
                state,
                effects,
                "Successfully logged in!",
                NotificationKind::Success,
            );
        }
        Err(err) => state.login_form.error = Some(form_error(&err, LOGIN_FAILED)),
    }
}

fn submit_register(
    state: &mut AppState,
    effects: &mut Vec<BackendCommand>,
    username: String,
    password: String,
    confirm_password: String,
) {
    if state.session.page() != Page::Register {
        return;
    }
    if state.register_form.is_loading() {
        debug!("registration already in progress; ignoring submission");
        return;
    }
    if username.trim().is_empty() || password.trim().is_empty() {
        state.register_form.error = Some(MISSING_CREDENTIALS.to_string());
        return;
    }
    if password != confirm_password {
        state.register_form.error = Some(PASSWORD_MISMATCH.to_string());
        return;
    }

    let request = state.next_request_id();
    state.register_form.begin(request);
    effects.push(BackendCommand::Register {
        request,
        username,
        password,
    });
}

fn register_completed(
    state: &mut AppState,
    effects: &mut Vec<BackendCommand>,
    request: RequestId,
    result: Result<Option<String>, ApiError>,
) {
    if !state.register_form.complete(request) {
        debug!(%request, "discarding stale registration response");
        return;
    }

    match result {
        // Account creation does not sign the user in.
        Ok(_) => {
            state.register_form.reset();
            state.login_form.error = None;
            state.session.show_unauthenticated(Page::Login);
            notify(
                state,
                effects,
                "Account created successfully!",
                NotificationKind::Success,
            );
        }
        Err(err) => state.register_form.error = Some(form_error(&err, REGISTRATION_FAILED)),
    }
}

fn logout(state: &mut AppState, effects: &mut Vec<BackendCommand>) {
    if let Some(username) = state.session.username() {
        info!(user = %username, "session cleared");
    }
    state.session.clear();
    state.view.reset();
    state.login_form.reset();
    state.register_form.reset();
    state.encrypt.reset();
    state.decrypt.reset();
    state.decrypt_owner.clear();
    state.files.reset();
    state.last_download = None;
    state.pending_downloads.clear();
    notify(
        state,
        effects,
        "Successfully logged out!",
        NotificationKind::Success,
    );
}

fn refresh_files(state: &mut AppState, effects: &mut Vec<BackendCommand>, username: String) {
    let request = state.next_request_id();
    state.files.pending = Some(request);
    effects.push(BackendCommand::FetchFiles { request, username });
}

fn stage_file(
    state: &mut AppState,
    effects: &mut Vec<BackendCommand>,
    role: TransferRole,
    file: Option<StagedFile>,
) {
    if !state.session.is_authenticated() {
        return;
    }
    if state.slot(role).in_flight.is_some() {
        notify(
            state,
            effects,
            format!("Wait for the current {role} to finish before choosing another file"),
            NotificationKind::Error,
        );
        return;
    }
    let Some(file) = file else {
        notify(
            state,
            effects,
            "Choose a file, not a directory",
            NotificationKind::Error,
        );
        return;
    };
    if !role.accepts(&file.name) {
        let accepted = role
            .accepted_extensions()
            .iter()
            .map(|extension| format!(".{extension}"))
            .collect::<Vec<_>>()
            .join(" ");
        notify(
            state,
            effects,
            format!("{} cannot be used here; accepted types: {accepted}", file.name),
            NotificationKind::Error,
        );
        return;
    }

    debug!(%role, file = %file.name, "file staged");
    state.slot_mut(role).staged = Some(file);
}

fn trigger_transfer(state: &mut AppState, effects: &mut Vec<BackendCommand>, role: TransferRole) {
    let Some(session_user) = state.session.username().map(str::to_string) else {
        return;
    };
    let slot = state.slot(role);
    if slot.in_flight.is_some() {
        debug!(%role, "transfer already in flight; ignoring trigger");
        return;
    }
    let Some(file) = slot.staged.clone() else {
        notify(
            state,
            effects,
            format!("Select a file to {role} first"),
            NotificationKind::Error,
        );
        return;
    };

    let username = match role {
        TransferRole::Encrypt => session_user,
        // Decrypt takes whatever owner the user typed, not the session user.
        TransferRole::Decrypt => {
            let owner = state.decrypt_owner.trim();
            if owner.is_empty() {
                notify(
                    state,
                    effects,
                    "Enter the username that encrypted the file",
                    NotificationKind::Error,
                );
                return;
            }
            owner.to_string()
        }
    };

    let request = state.next_request_id();
    state.slot_mut(role).in_flight = Some(InFlightTransfer {
        request,
        username: username.clone(),
    });
    effects.push(BackendCommand::Transfer {
        role,
        request,
        username,
        file,
    });
}

fn transfer_completed(
    state: &mut AppState,
    effects: &mut Vec<BackendCommand>,
    role: TransferRole,
    request: RequestId,
    result: Result<Vec<u8>, ApiError>,
) {
    let slot = state.slot_mut(role);
    let in_flight = match slot.in_flight.take() {
        Some(in_flight) if in_flight.request == request => in_flight,
        other => {
            slot.in_flight = other;
            debug!(%role, %request, "discarding stale transfer response");
            return;
        }
    };

    let (done, failed) = match role {
        TransferRole::Encrypt => ("File encrypted successfully!", "Encryption failed"),
        TransferRole::Decrypt => ("File decrypted successfully!", "Decryption failed"),
    };

    match result {
        Ok(bytes) => {
            let Some(staged) = slot.staged.take() else {
                warn!(%role, "transfer finished without a staged file");
                return;
            };
            let name = role.output_name(&staged.name);
            info!(%role, file = %name, size_bytes = bytes.len(), "transfer succeeded");
            let download = state.next_request_id();
            state.pending_downloads.push(download);
            effects.push(BackendCommand::SaveDownload {
                request: download,
                name,
                bytes,
            });
            if role == TransferRole::Decrypt {
                state.decrypt_owner.clear();
            }
            notify(state, effects, done, NotificationKind::Success);
            refresh_files(state, effects, in_flight.username);
        }
        // The staged file stays so the user can retry.
        Err(err) => {
            let message = match err.kind {
                FailureKind::ConnectivityFailed => {
                    format!("{failed}! Please check server connection.")
                }
                FailureKind::ValidationFailed | FailureKind::RemoteRejected => {
                    match err.message.as_deref().map(str::trim) {
                        Some(detail) if !detail.is_empty() => format!("{failed}: {detail}"),
                        _ => format!("{failed}! Please check server connection."),
                    }
                }
            };
            notify(state, effects, message, NotificationKind::Error);
        }
    }
}

#[cfg(test)]
#[path = "../tests/reducer_tests.rs"]
mod tests;
