use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::parse_base_url;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "vault_shell.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub download_dir: PathBuf,
    pub notification_ttl_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".into(),
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            notification_ttl_ms: 3000,
        }
    }
}

impl Settings {
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_base: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn load_settings(cli: &CliOverrides) -> anyhow::Result<Settings> {
    load_settings_with(cli, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match &cli.config {
        // An explicitly named file must exist.
        Some(path) => apply_file(&mut settings, path, true)?,
        None => apply_file(&mut settings, Path::new(DEFAULT_CONFIG_FILE), false)?,
    }

    if let Some(v) = env("VAULT_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = env("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = env("VAULT_DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }
    if let Some(v) = env("APP__DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }

    if let Some(v) = env("APP__NOTIFICATION_TTL_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.notification_ttl_ms = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__NOTIFICATION_TTL_MS"),
        }
    }

    if let Some(v) = &cli.api_base {
        settings.api_base = v.clone();
    }
    if let Some(v) = &cli.download_dir {
        settings.download_dir = v.clone();
    }

    parse_base_url(&settings.api_base)
        .with_context(|| format!("invalid api base '{}'", settings.api_base))?;

    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path, required: bool) -> anyhow::Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    let table = raw
        .parse::<toml::Table>()
        .with_context(|| format!("failed to parse '{}'", path.display()))?;

    if let Some(v) = table.get("api_base").and_then(toml::Value::as_str) {
        settings.api_base = v.to_string();
    }
    if let Some(v) = table.get("download_dir").and_then(toml::Value::as_str) {
        settings.download_dir = PathBuf::from(v);
    }
    match table.get("notification_ttl_ms") {
        Some(toml::Value::Integer(ms)) if *ms >= 0 => settings.notification_ttl_ms = *ms as u64,
        Some(toml::Value::String(ms)) => match ms.trim().parse::<u64>() {
            Ok(parsed) => settings.notification_ttl_ms = parsed,
            Err(_) => warn!(value = %ms, "ignoring invalid notification_ttl_ms"),
        },
        Some(other) => warn!(value = %other, "ignoring invalid notification_ttl_ms"),
        None => {}
    }

    Ok(())
}
