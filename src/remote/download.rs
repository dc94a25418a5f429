// SPDX-License-Identifier: GPL-3.0-only

//! Compiled document download

use super::ServerClient;
use crate::constants::file_formats;
use crate::errors::RemoteError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// What to do with a compiled document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadAction {
    /// Fetch the file into the download directory
    #[default]
    Save,
    /// Hand the URL to the desktop's default handler
    Open,
}

/// Where the document ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    Opened(String),
}

impl std::fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadOutcome::Saved(path) => write!(f, "saved to {}", path.display()),
            DownloadOutcome::Opened(url) => write!(f, "opened {}", url),
        }
    }
}

/// Performs the single download that follows a successful compile
#[derive(Debug, Clone)]
pub struct Downloader {
    server: ServerClient,
    action: DownloadAction,
    dir: PathBuf,
}

impl Downloader {
    /// `dir` defaults to the user's download directory
    pub fn new(server: ServerClient, action: DownloadAction, dir: Option<PathBuf>) -> Self {
        let dir = dir
            .or_else(dirs::download_dir)
            .unwrap_or_else(std::env::temp_dir);
        Self {
            server,
            action,
            dir,
        }
    }

    pub fn action(&self) -> DownloadAction {
        self.action
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Fetch or open `download_url`
    pub async fn download(&self, download_url: &str) -> Result<DownloadOutcome, RemoteError> {
        let url = self
            .server
            .resolve(download_url)
            .map_err(|e| RemoteError::Download(e.to_string()))?;

        match self.action {
            DownloadAction::Open => {
                open::that(url.as_str())
                    .map_err(|e| RemoteError::Download(format!("failed to open {}: {}", url, e)))?;
                info!(url = %url, "Document opened");
                Ok(DownloadOutcome::Opened(url.to_string()))
            }
            DownloadAction::Save => self.save(url).await,
        }
    }

    async fn save(&self, url: Url) -> Result<DownloadOutcome, RemoteError> {
        let response = self
            .server
            .http()
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RemoteError::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Download(format!(
                "HTTP {}: {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Download(e.to_string()))?;

        let path = self.dir.join(document_file_name(&url));
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RemoteError::Download(format!("{}: {}", self.dir.display(), e)))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| RemoteError::Download(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = bytes.len(), "Document saved");
        Ok(DownloadOutcome::Saved(path))
    }
}

/// Last URL path segment, or a timestamped fallback name
fn document_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && !name.contains(".."))
        .map(|name| name.to_string())
        .unwrap_or_else(|| {
            format!(
                "{}_{}.pdf",
                file_formats::FALLBACK_DOCUMENT_PREFIX,
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            )
        })
}
