// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    SessionModel     │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ DeviceRegistry      │  ← which cameras exist, which one is active
//! │ CaptureStream       │  ← the one live handle
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← platform boundary
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐   ┌───────┐
//!   │ V4L2 │   │ Still │
//!   └──────┘   └───────┘
//! ```

pub mod format_converters;
pub mod registry;
pub mod still;
pub mod stream;
pub mod types;
pub mod v4l2;

pub use registry::{Device, DeviceRegistry, next_device};
pub use stream::{CaptureStream, StreamPhase};
pub use types::*;

use std::path::PathBuf;

/// Platform camera access
///
/// Implementations enumerate devices and hand out live streams. They do not
/// track which stream is active; [`CaptureStream`] owns that rule.
pub trait CameraBackend: Send {
    /// Enumerate every media device the platform reports
    ///
    /// Returns `BackendError::PermissionDenied` when the platform refuses to
    /// list devices at all.
    fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>>;

    /// Acquire a live stream for the constrained device
    fn open_stream(&mut self, constraints: &StreamConstraints) -> BackendResult<Box<dyn LiveStream>>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// An acquired, currently streaming camera
pub trait LiveStream: Send {
    /// Device this stream was opened on
    fn device_id(&self) -> &str;

    /// Negotiated resolution
    fn resolution(&self) -> (u32, u32);

    /// Most recent frame, if the device has produced one
    fn latest_frame(&self) -> Option<CameraFrame>;

    /// Release the device
    ///
    /// Must not return before the underlying device is closed. Idempotent.
    fn stop(&mut self);

    /// Whether the stream still holds the device
    fn is_active(&self) -> bool;
}

/// Create a backend instance for the given type
///
/// `still_images` is only used by the still-image backend.
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    still_images: &[PathBuf],
) -> BackendResult<Box<dyn CameraBackend>> {
    match backend_type {
        CameraBackendType::V4l2 => Ok(Box::new(v4l2::V4l2Backend::new())),
        CameraBackendType::Still => Ok(Box::new(still::StillImageBackend::from_paths(
            still_images,
        )?)),
    }
}
