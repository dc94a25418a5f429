// SPDX-License-Identifier: GPL-3.0-only

//! Document compilation requests

use super::ServerClient;
use super::wire::{CompileRequest, CompileResponse};
use crate::constants::endpoints;
use crate::errors::RemoteError;
use tracing::{info, warn};

/// Location of a compiled document, consumed by exactly one download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub download_url: String,
}

/// Client for `POST /compile`
#[derive(Debug, Clone)]
pub struct CompileClient {
    server: ServerClient,
}

impl CompileClient {
    pub fn new(server: ServerClient) -> Self {
        Self { server }
    }

    /// Request a document made of `filenames`, in that order
    ///
    /// Callers must not pass an empty list.
    pub async fn compile(&self, filenames: Vec<String>) -> Result<CompileResult, RemoteError> {
        debug_assert!(!filenames.is_empty(), "compile requires at least one page");
        info!(pages = filenames.len(), "Requesting compilation");

        let response: CompileResponse = self
            .server
            .post_json(endpoints::COMPILE, &CompileRequest { filenames })
            .await?;
        interpret_compile_response(response)
    }
}

/// Map a `/compile` reply onto the session outcome
pub fn interpret_compile_response(
    response: CompileResponse,
) -> Result<CompileResult, RemoteError> {
    match (response.success, response.download_url) {
        (true, Some(download_url)) => Ok(CompileResult { download_url }),
        (true, None) => Err(RemoteError::Compile(
            "response is missing download_url".to_string(),
        )),
        (false, _) => {
            let reason = response
                .error
                .unwrap_or_else(|| "unknown error".to_string());
            warn!(%reason, "Compilation rejected");
            Err(RemoteError::Compile(reason))
        }
    }
}
