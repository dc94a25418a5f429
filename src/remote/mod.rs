// SPDX-License-Identifier: GPL-3.0-only

//! Remote processing service
//!
//! The service owns document detection, filtering and PDF compilation. This
//! module only speaks its JSON protocol:
//!
//! - `POST /process` - [`ProcessingClient`]
//! - `POST /compile` - [`CompileClient`]
//! - `POST /cleanup` - [`ServerClient::cleanup`]
//! - `GET <download_url>` - [`Downloader`]
//!
//! HTTP status codes are not consulted for the JSON endpoints; the service
//! reports failures in the body.

pub mod compile;
pub mod download;
pub mod process;
pub mod wire;

pub use compile::{CompileClient, CompileResult};
pub use download::{DownloadAction, DownloadOutcome, Downloader};
pub use process::{ProcessOutcome, ProcessingClient};

use crate::constants::endpoints;
use crate::errors::RemoteError;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// HTTP client bound to one service base URL
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ServerClient {
    base: Url,
    http: reqwest::Client,
}

impl ServerClient {
    /// Create a client for `server_url`
    ///
    /// `timeout` bounds each request end to end. Without it a request that
    /// never answers stays outstanding.
    pub fn new(server_url: &str, timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let mut normalized = server_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)
            .map_err(|e| RemoteError::Server(format!("invalid server URL '{}': {}", server_url, e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        debug!(base = %base, ?timeout, "Server client created");
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve an endpoint path or a server-provided URL against the base
    ///
    /// Absolute URLs pass through unchanged; `/download_pdf/x.pdf` resolves
    /// against the server origin.
    pub fn resolve(&self, url: &str) -> Result<Url, RemoteError> {
        self.base
            .join(url)
            .map_err(|e| RemoteError::Server(format!("invalid URL '{}': {}", url, e)))
    }

    /// POST a JSON body and decode the JSON reply, whatever the status
    pub(crate) async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, RemoteError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        let response = self.http.post(url.clone()).json(body).send().await?;
        let status = response.status();
        debug!(url = %url, %status, "Response received");

        response
            .json::<R>()
            .await
            .map_err(|e| RemoteError::Server(format!("invalid response from {}: {}", url, e)))
    }

    /// Ask the service to clear its scratch files
    pub async fn cleanup(&self) -> Result<(), RemoteError> {
        let response: wire::CleanupResponse = self
            .post_json(endpoints::CLEANUP, &serde_json::json!({}))
            .await?;
        if response.success {
            info!("Server cleanup completed");
            Ok(())
        } else {
            Err(RemoteError::Server(
                response
                    .error
                    .unwrap_or_else(|| "cleanup rejected".to_string()),
            ))
        }
    }
}
