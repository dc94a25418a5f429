// SPDX-License-Identifier: GPL-3.0-only

//! Still-image cameras
//!
//! Serves image files as if they were cameras: each file is one device that
//! always shows the same frame. Useful for demos without hardware and for
//! driving a session against a real processing server from a folder of
//! photos.

use super::types::{
    BackendError, BackendResult, CameraBackendType, CameraFrame, MediaDeviceInfo, PixelFormat,
    StreamConstraints,
};
use super::{CameraBackend, LiveStream};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Load an image file as an RGB camera frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgb = img.to_rgb8();
    let width = rgb.width();
    let height = rgb.height();

    debug!(width, height, "Image loaded successfully");
    Ok(CameraFrame::new(width, height, PixelFormat::RGB24, rgb.into_raw()))
}

struct StillSource {
    id: String,
    label: String,
    frame: CameraFrame,
}

/// Backend whose devices are fixed frames
pub struct StillImageBackend {
    sources: Vec<StillSource>,
}

impl StillImageBackend {
    /// One device per image file; the file name becomes the label
    pub fn from_paths(paths: &[PathBuf]) -> BackendResult<Self> {
        if paths.is_empty() {
            return Err(BackendError::NotAvailable(
                "no still images configured".to_string(),
            ));
        }

        let sources = paths
            .iter()
            .map(|path| {
                Ok(StillSource {
                    id: path.display().to_string(),
                    label: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    frame: load_image_as_frame(path)?,
                })
            })
            .collect::<BackendResult<Vec<_>>>()?;

        Ok(Self { sources })
    }

    /// Build from in-memory frames as `(id, label, frame)`
    pub fn from_frames(frames: Vec<(String, String, CameraFrame)>) -> Self {
        Self {
            sources: frames
                .into_iter()
                .map(|(id, label, frame)| StillSource { id, label, frame })
                .collect(),
        }
    }
}

impl CameraBackend for StillImageBackend {
    fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>> {
        Ok(self
            .sources
            .iter()
            .map(|s| MediaDeviceInfo::video_input(s.id.clone(), s.label.clone()))
            .collect())
    }

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn LiveStream>> {
        let source = self
            .sources
            .iter()
            .find(|s| s.id == constraints.device_id)
            .ok_or_else(|| BackendError::DeviceNotFound(constraints.device_id.clone()))?;

        // Native resolution regardless of the hint, like a fixed-mode camera
        Ok(Box::new(StillStream {
            device_id: source.id.clone(),
            frame: Some(source.frame.clone()),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Still
    }
}

/// Live handle of a still-image device
pub struct StillStream {
    device_id: String,
    frame: Option<CameraFrame>,
}

impl LiveStream for StillStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn resolution(&self) -> (u32, u32) {
        self.frame
            .as_ref()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.frame.as_ref().map(|f| CameraFrame {
            captured_at: Instant::now(),
            ..f.clone()
        })
    }

    fn stop(&mut self) {
        self.frame = None;
    }

    fn is_active(&self) -> bool {
        self.frame.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let backend = StillImageBackend::from_paths(&[path]).unwrap();
        let devices = backend.enumerate_devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].label, "page.png");
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let err = load_image_as_frame(Path::new("clip.mp4")).unwrap_err();
        assert!(matches!(err, BackendError::FormatNotSupported(_)));
    }

    #[test]
    fn test_empty_path_list_is_unavailable() {
        assert!(matches!(
            StillImageBackend::from_paths(&[]),
            Err(BackendError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_stop_releases_frame() {
        let frame = CameraFrame::new(1, 1, PixelFormat::Gray8, vec![0]);
        let mut backend =
            StillImageBackend::from_frames(vec![("cam".into(), "Cam".into(), frame)]);
        let mut stream = backend
            .open_stream(&StreamConstraints {
                device_id: "cam".into(),
                ideal_width: 640,
                ideal_height: 480,
            })
            .unwrap();
        assert!(stream.is_active());
        stream.stop();
        assert!(!stream.is_active());
        assert!(stream.latest_frame().is_none());
    }
}
