// SPDX-License-Identifier: MPL-2.0

//! Error types for the scan client
//!
//! Every failure in a capture session ends up as one of these. The session
//! never lets them escape as panics: [`crate::app::SessionModel::update`]
//! turns them into notices. The [`AppError::level`] mapping decides how loud
//! that notice is.

use crate::app::state::{NoticeLevel, Operation};
use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Remote service errors
    Remote(RemoteError),
    /// An operation of this kind already has a request outstanding
    Busy(Operation),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Device enumeration or access denied by the platform
    PermissionDenied(String),
    /// Stream could not be acquired
    AcquisitionFailed(String),
    /// Enumeration succeeded but produced no video inputs
    NoCameraFound,
    /// Flip requested with fewer than two cameras
    OnlyOneDevice,
    /// Requested device is not in the registry
    DeviceNotFound(String),
    /// Capture requested without a live stream
    NoLiveStream,
    /// Live stream has not produced a frame yet
    NoFrameAvailable,
    /// JPEG encoding failed
    EncodingFailed(String),
}

/// Remote service errors
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Transport failure or a body that is not the expected JSON
    Server(String),
    /// Processing endpoint answered `success: false`
    Processing(String),
    /// Compile endpoint answered `success: false`
    Compile(String),
    /// Compiled document could not be fetched or opened
    Download(String),
}

impl AppError {
    /// Notice level used when this error is reported to the operator
    pub fn level(&self) -> NoticeLevel {
        match self {
            AppError::Camera(CameraError::OnlyOneDevice) => NoticeLevel::Info,
            AppError::Busy(_) => NoticeLevel::Info,
            _ => NoticeLevel::Error,
        }
    }

    /// Short operator-facing message
    pub fn notice_message(&self) -> String {
        match self {
            AppError::Camera(CameraError::PermissionDenied(_)) => {
                "Camera permission denied or not available.".to_string()
            }
            AppError::Camera(CameraError::NoCameraFound) => "No cameras found.".to_string(),
            AppError::Camera(CameraError::OnlyOneDevice) => "Only one camera found".to_string(),
            AppError::Remote(RemoteError::Server(_)) => "Server error".to_string(),
            AppError::Remote(RemoteError::Processing(reason)) => {
                format!("Processing failed: {}", reason)
            }
            AppError::Remote(RemoteError::Compile(_)) => "Compilation error".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Remote(e) => write!(f, "Remote error: {}", e),
            AppError::Busy(op) => write!(f, "{} already in progress", op),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            CameraError::AcquisitionFailed(msg) => write!(f, "Could not start camera: {}", msg),
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::OnlyOneDevice => write!(f, "Only one camera available"),
            CameraError::DeviceNotFound(id) => write!(f, "Camera not found: {}", id),
            CameraError::NoLiveStream => write!(f, "Camera is not running"),
            CameraError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CameraError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Server(msg) => write!(f, "Server error: {}", msg),
            RemoteError::Processing(msg) => write!(f, "Processing failed: {}", msg),
            RemoteError::Compile(msg) => write!(f, "Compilation failed: {}", msg),
            RemoteError::Download(msg) => write!(f, "Download failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for RemoteError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        AppError::Remote(err)
    }
}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied(msg) => CameraError::PermissionDenied(msg),
            BackendError::DeviceNotFound(id) => CameraError::DeviceNotFound(id),
            other => CameraError::AcquisitionFailed(other.to_string()),
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err.into())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Server(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
