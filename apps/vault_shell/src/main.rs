use std::{io, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use client_core::{parse_base_url, HttpVaultClient};
use crossbeam_channel::bounded;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use backend_bridge::{commands::BackendCommand, download::DirectoryDownloadSink, runtime};
use config::{load_settings, CliOverrides};
use controller::{events::UiEvent, state::AppState};
use ui::{console, ShellApp};

#[derive(Parser, Debug)]
#[command(about = "Console client for the file vault service")]
struct Args {
    /// Base address of the vault service, e.g. http://localhost:8000
    #[arg(long)]
    api_base: Option<String>,
    /// Directory where encrypted and decrypted results are written
    #[arg(long)]
    download_dir: Option<PathBuf>,
    /// Settings file (defaults to ./vault_shell.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(&CliOverrides {
        api_base: args.api_base,
        download_dir: args.download_dir,
        config: args.config,
    })
    .context("failed to load settings")?;
    let base_url = parse_base_url(&settings.api_base)?;
    info!(
        api_base = %base_url,
        download_dir = %settings.download_dir.display(),
        "starting vault shell"
    );

    let gateway = Arc::new(HttpVaultClient::new(base_url));
    let sink = Arc::new(DirectoryDownloadSink::new(settings.download_dir.clone()));

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let (input_tx, input_rx) = bounded(16);
    let backend = runtime::launch(cmd_rx, ui_tx, gateway, sink);
    console::spawn_stdin_reader(input_tx);

    let mut app = ShellApp::new(
        AppState::new(settings.notification_ttl()),
        cmd_tx,
        ui_rx,
        input_rx,
        io::stdout(),
    );
    app.run()?;

    // Dropping the shell closes the command queue, which stops the worker.
    drop(app);
    if backend.join().is_err() {
        anyhow::bail!("backend worker panicked");
    }
    Ok(())
}
