//! Where finished transfers end up on the local machine.

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};

const MAX_NAME_ATTEMPTS: u32 = 10_000;

pub trait DownloadSink: Send + Sync {
    /// Persists `bytes` under a name derived from `name` and returns the path written.
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes downloads into one directory without overwriting existing files.
pub struct DirectoryDownloadSink {
    dir: PathBuf,
}

impl DirectoryDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectoryDownloadSink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create download directory '{}'", self.dir.display())
        })?;
        let base = sanitize_file_name(name);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.dir.join(numbered_name(&base, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .with_context(|| format!("failed to write '{}'", path.display()))?;
                    return Ok(path);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to create '{}'", path.display()))
                }
            }
        }

        Err(anyhow!(
            "no free file name for '{base}' in '{}'",
            self.dir.display()
        ))
    }
}

fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => "download".to_string(),
        other => other.to_string(),
    }
}

/// `report.pdf` -> `report (1).pdf`; dotfiles keep their leading dot.
fn numbered_name(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        return base.to_string();
    }
    match base.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({attempt}){}", &base[..dot], &base[dot..]),
        _ => format!("{base} ({attempt})"),
    }
}
