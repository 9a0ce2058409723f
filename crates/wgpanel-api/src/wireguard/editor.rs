use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};
use wgpanel_core::fsutil;

static SECTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*\[Interface\].*\[Peer\]").expect("valid regex"));
static PRIVATE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PrivateKey\s*=").expect("valid regex"));
static PUBLIC_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PublicKey\s*=").expect("valid regex"));

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Configuration file not found")]
    NotFound,

    #[error("Error reading configuration file")]
    Read(#[source] io::Error),

    #[error("No configuration data provided")]
    EmptyInput,

    #[error("Invalid WireGuard configuration format. Must contain [Interface] and [Peer] sections.")]
    FormatInvalid,

    #[error("Configuration must contain PrivateKey in [Interface] and PublicKey in [Peer] sections.")]
    MissingFields,

    #[error("Failed to create wireguard directory")]
    DirCreate(#[source] io::Error),

    #[error("Failed to write configuration file")]
    Write(#[source] io::Error),
}

/// Structural checks applied before a config is written. The text itself is
/// stored verbatim.
pub fn validate(text: &str) -> Result<(), EditorError> {
    if text.trim().is_empty() {
        return Err(EditorError::EmptyInput);
    }
    if !SECTIONS.is_match(text) {
        return Err(EditorError::FormatInvalid);
    }
    if !PRIVATE_KEY.is_match(text) || !PUBLIC_KEY.is_match(text) {
        return Err(EditorError::MissingFields);
    }
    Ok(())
}

/// Reads and replaces the WireGuard config file as a single blob.
#[derive(Debug, Clone)]
pub struct ConfigEditor {
    path: PathBuf,
}

impl ConfigEditor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<String, EditorError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                debug!(bytes = contents.len(), "loaded wireguard config");
                Ok(contents)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(EditorError::NotFound),
            Err(e) => Err(EditorError::Read(e)),
        }
    }

    #[tracing::instrument(skip(self, text), fields(path = %self.path.display()))]
    pub async fn save(&self, text: &str) -> Result<(), EditorError> {
        validate(text)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !tokio::fs::try_exists(parent).await.unwrap_or(false) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(EditorError::DirCreate)?;
                info!(dir = %parent.display(), "created wireguard directory");
            }
        }

        // Temp file is 0600 before it is renamed over the target.
        let path = self.path.clone();
        let bytes = text.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || fsutil::write_atomic(&path, &bytes))
            .await
            .map_err(|e| EditorError::Write(io::Error::other(e)))?
            .map_err(EditorError::Write)?;

        info!(bytes = text.len(), "saved wireguard config");
        Ok(())
    }
}
