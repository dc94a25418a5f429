// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing requests

use super::ServerClient;
use super::wire::{ProcessRequest, ProcessResponse};
use crate::app::gallery::PageRecord;
use crate::constants::endpoints;
use crate::errors::RemoteError;
use crate::pipelines::photo::CapturedFrame;
use tracing::{info, warn};

/// Accepted processing result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub record: PageRecord,
    /// No document outline was found; the page is the full frame
    pub low_confidence: bool,
}

/// Client for `POST /process`
#[derive(Debug, Clone)]
pub struct ProcessingClient {
    server: ServerClient,
}

impl ProcessingClient {
    pub fn new(server: ServerClient) -> Self {
        Self { server }
    }

    /// Send a captured frame and interpret the reply
    pub async fn submit(&self, frame: &CapturedFrame) -> Result<ProcessOutcome, RemoteError> {
        let request = ProcessRequest {
            image: frame.to_data_uri(),
            filter: frame.filter,
        };
        info!(
            bytes = frame.encoded.len(),
            filter = frame.filter.as_str(),
            "Submitting frame for processing"
        );

        let response: ProcessResponse = self
            .server
            .post_json(endpoints::PROCESS, &request)
            .await?;
        interpret_process_response(response)
    }
}

/// Map a `/process` reply onto the session outcome
pub fn interpret_process_response(
    response: ProcessResponse,
) -> Result<ProcessOutcome, RemoteError> {
    if !response.success {
        let reason = response
            .error
            .unwrap_or_else(|| "unknown error".to_string());
        warn!(%reason, "Processing rejected");
        return Err(RemoteError::Processing(reason));
    }

    let (Some(filename), Some(url)) = (response.filename, response.url) else {
        return Err(RemoteError::Processing(
            "response is missing filename or url".to_string(),
        ));
    };

    let detected = response.detected.unwrap_or(false);
    Ok(ProcessOutcome {
        record: PageRecord {
            filename,
            url,
            detected,
        },
        low_confidence: !detected,
    })
}
