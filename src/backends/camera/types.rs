// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackendType {
    /// Video4Linux2 devices under /dev/video*
    #[default]
    V4l2,
    /// Image files served as virtual cameras
    Still,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Still => write!(f, "still image"),
        }
    }
}

/// Kind of a platform media device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    /// Camera or other video capture source
    VideoInput,
    /// Anything else the platform reports (metadata nodes, outputs, ...)
    Other(String),
}

impl DeviceKind {
    /// Platform kind string ("videoinput" for cameras)
    pub fn as_str(&self) -> &str {
        match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::Other(kind) => kind,
        }
    }
}

/// A device entry as reported by the platform, before filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDeviceInfo {
    /// Opaque device identifier (a device node path for V4L2)
    pub device_id: String,
    /// What the device is
    pub kind: DeviceKind,
    /// Human-readable name, may be empty
    pub label: String,
}

impl MediaDeviceInfo {
    /// Create a video input entry
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            kind: DeviceKind::VideoInput,
            label: label.into(),
        }
    }
}

/// Constraints for opening a stream
///
/// The resolution is a hint: backends choose the nearest supported mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Exact device to open
    pub device_id: String,
    /// Preferred width in pixels
    pub ideal_width: u32,
    /// Preferred height in pixels
    pub ideal_height: u32,
}

/// Pixel format of a decoded camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGB24 => 3,
            Self::RGBA => 4,
            Self::Gray8 => 1,
        }
    }
}

/// A single decoded frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// When the frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a tightly packed frame
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format,
            stride: width * format.bytes_per_pixel(),
            captured_at: Instant::now(),
        }
    }

    /// Sample one pixel as RGB, clamping coordinates to the frame
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let bpp = self.format.bytes_per_pixel();
        let idx = (y * self.stride + x * bpp) as usize;

        match self.format {
            PixelFormat::RGB24 | PixelFormat::RGBA => {
                if idx + 2 < self.data.len() {
                    (self.data[idx], self.data[idx + 1], self.data[idx + 2])
                } else {
                    (0, 0, 0)
                }
            }
            PixelFormat::Gray8 => match self.data.get(idx) {
                Some(&v) => (v, v, v),
                None => (0, 0, 0),
            },
        }
    }

    /// Pack the frame into an RGB image (stride padding removed)
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            let row_start = (y * self.stride) as usize;
            let row_len = (self.width * self.format.bytes_per_pixel()) as usize;
            let row = self.data.get(row_start..row_start + row_len)?;
            match self.format {
                PixelFormat::RGB24 => rgb.extend_from_slice(row),
                PixelFormat::RGBA => {
                    for px in row.chunks_exact(4) {
                        rgb.extend_from_slice(&px[..3]);
                    }
                }
                PixelFormat::Gray8 => {
                    for &v in row {
                        rgb.extend_from_slice(&[v, v, v]);
                    }
                }
            }
        }
        image::ImageBuffer::from_raw(self.width, self.height, rgb)
    }

    /// Mean luma (BT.601) over a sparse grid of samples
    pub fn mean_luma(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let step_x = (self.width / 64).max(1);
        let step_y = (self.height / 64).max(1);
        let mut sum = 0.0f64;
        let mut count = 0u32;
        for y in (0..self.height).step_by(step_y as usize) {
            for x in (0..self.width).step_by(step_x as usize) {
                let (r, g, b) = self.pixel_rgb(x, y);
                sum += 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
                count += 1;
            }
        }
        (sum / count.max(1) as f64) as f32
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Platform refused access to the device(s)
    PermissionDenied(String),
    /// Backend is not available on this system
    NotAvailable(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Device opened but could not be configured or started
    AcquisitionFailed(String),
    /// Format not supported
    FormatNotSupported(String),
    /// General I/O error
    Io(String),
    /// Other errors
    Other(String),
}

impl BackendError {
    /// Classify an I/O error raised while touching `device`
    pub fn from_io(device: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                BackendError::PermissionDenied(format!("{}: {}", device, err))
            }
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(device.to_string()),
            _ => BackendError::Io(format!("{}: {}", device, err)),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::AcquisitionFailed(msg) => write!(f, "Acquisition failed: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
