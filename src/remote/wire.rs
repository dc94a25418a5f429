// SPDX-License-Identifier: GPL-3.0-only

//! JSON bodies exchanged with the processing service

use crate::pipelines::photo::FilterMode;
use serde::{Deserialize, Serialize};

/// `POST /process` request
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRequest {
    /// `data:image/jpeg;base64,...`
    pub image: String,
    pub filter: FilterMode,
}

/// `POST /process` response
///
/// Error replies carry only `error`, so every field is optional and a
/// missing `success` reads as false.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub success: bool,
    pub filename: Option<String>,
    pub url: Option<String>,
    pub detected: Option<bool>,
    pub error: Option<String>,
}

/// `POST /compile` request
#[derive(Debug, Clone, Serialize)]
pub struct CompileRequest {
    pub filenames: Vec<String>,
}

/// `POST /compile` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompileResponse {
    #[serde(default)]
    pub success: bool,
    pub download_url: Option<String>,
    pub error: Option<String>,
}

/// `POST /cleanup` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanupResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_only_body() {
        let resp: ProcessResponse =
            serde_json::from_str(r#"{"error": "No image data provided"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("No image data provided"));
        assert!(resp.detected.is_none());
    }

    #[test]
    fn test_process_request_shape() {
        let body = serde_json::to_value(ProcessRequest {
            image: "data:image/jpeg;base64,AA==".into(),
            filter: FilterMode::Gray,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"image": "data:image/jpeg;base64,AA==", "filter": "gray"})
        );
    }
}
