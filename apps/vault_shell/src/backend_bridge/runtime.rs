//! Runtime bridge between the UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{FileUpload, VaultGateway};
use crossbeam_channel::{Receiver, Sender};
use shared::{domain::TransferRole, error::ApiError};
use tracing::{debug, error, info};

use crate::backend_bridge::{
    commands::BackendCommand, download::DownloadSink, timers::NotificationTimer,
};
use crate::controller::{events::UiEvent, state::StagedFile};

/// Starts the backend worker thread. It exits once every command sender is dropped.
pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    gateway: Arc<dyn VaultGateway>,
    sink: Arc<dyn DownloadSink>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Info(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut worker = BackendWorker::new(gateway, sink, ui_tx.clone());
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
            while let Ok(cmd) = cmd_rx.recv() {
                worker.execute(cmd);
            }
            info!("backend command queue closed; worker stopping");
        });
    })
}

pub struct BackendWorker {
    gateway: Arc<dyn VaultGateway>,
    sink: Arc<dyn DownloadSink>,
    ui_tx: Sender<UiEvent>,
    expiry: NotificationTimer,
}

impl BackendWorker {
    pub fn new(
        gateway: Arc<dyn VaultGateway>,
        sink: Arc<dyn DownloadSink>,
        ui_tx: Sender<UiEvent>,
    ) -> Self {
        let expiry = NotificationTimer::new(ui_tx.clone());
        Self {
            gateway,
            sink,
            ui_tx,
            expiry,
        }
    }

    /// Starts `cmd` and returns immediately; completions arrive as `UiEvent`s.
    /// Must be called from within a tokio runtime.
    pub fn execute(&mut self, cmd: BackendCommand) {
        debug!(command = cmd.name(), "backend executing command");
        match cmd {
            BackendCommand::Login {
                request,
                username,
                password,
            } => {
                let gateway = Arc::clone(&self.gateway);
                self.spawn_reply(async move {
                    let result = gateway
                        .login(&username, &password)
                        .await
                        .map_err(ApiError::from);
                    UiEvent::LoginCompleted { request, result }
                });
            }
            BackendCommand::Register {
                request,
                username,
                password,
            } => {
                let gateway = Arc::clone(&self.gateway);
                self.spawn_reply(async move {
                    let result = gateway
                        .register(&username, &password)
                        .await
                        .map_err(ApiError::from);
                    UiEvent::RegisterCompleted { request, result }
                });
            }
            BackendCommand::FetchFiles { request, username } => {
                let gateway = Arc::clone(&self.gateway);
                self.spawn_reply(async move {
                    let result = gateway
                        .list_files(&username)
                        .await
                        .map_err(ApiError::from);
                    UiEvent::FilesLoaded { request, result }
                });
            }
            BackendCommand::Transfer {
                role,
                request,
                username,
                file,
            } => {
                let gateway = Arc::clone(&self.gateway);
                self.spawn_reply(async move {
                    let result = run_transfer(gateway.as_ref(), role, &username, file).await;
                    UiEvent::TransferCompleted {
                        role,
                        request,
                        result,
                    }
                });
            }
            BackendCommand::SaveDownload {
                request,
                name,
                bytes,
            } => {
                let sink = Arc::clone(&self.sink);
                let ui_tx = self.ui_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let event = match sink.save(&name, &bytes) {
                        Ok(path) => UiEvent::DownloadSaved {
                            request,
                            name,
                            path,
                        },
                        Err(err) => UiEvent::DownloadFailed {
                            request,
                            name,
                            reason: format!("{err:#}"),
                        },
                    };
                    // The payload is released here, once it is on disk.
                    drop(bytes);
                    if ui_tx.send(event).is_err() {
                        debug!("ui event channel closed; dropping download result");
                    }
                });
            }
            BackendCommand::ScheduleNotificationExpiry { id, after } => {
                self.expiry.schedule(id, after)
            }
            BackendCommand::CancelNotificationExpiry => self.expiry.cancel(),
        }
    }

    fn spawn_reply<F>(&self, work: F)
    where
        F: std::future::Future<Output = UiEvent> + Send + 'static,
    {
        let ui_tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let event = work.await;
            if ui_tx.send(event).is_err() {
                debug!("ui event channel closed; dropping backend completion");
            }
        });
    }
}

async fn run_transfer(
    gateway: &dyn VaultGateway,
    role: TransferRole,
    username: &str,
    file: StagedFile,
) -> Result<Vec<u8>, ApiError> {
    let bytes = tokio::fs::read(&file.path).await.map_err(|err| {
        ApiError::validation(format!("could not read {}: {err}", file.name))
    })?;
    let upload = FileUpload::new(file.name, bytes);
    let result = match role {
        TransferRole::Encrypt => gateway.encrypt(username, upload).await,
        TransferRole::Decrypt => gateway.decrypt(username, upload).await,
    };
    result.map_err(ApiError::from)
}

#[cfg(test)]
#[path = "../tests/runtime_tests.rs"]
mod tests;
