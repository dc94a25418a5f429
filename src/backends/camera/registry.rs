// SPDX-License-Identifier: GPL-3.0-only

//! Camera device registry
//!
//! Holds the enumerated video inputs in platform order and the single active
//! selection. Switching cameras cycles through this list.

use super::CameraBackend;
use super::types::{DeviceKind, MediaDeviceInfo};
use crate::errors::CameraError;
use tracing::{debug, info, warn};

/// A selectable camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub label: String,
}

/// Enumerated cameras plus the active one
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    active: Option<usize>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read the device list from the backend
    ///
    /// Only video inputs are kept. Unlabelled devices are named after their
    /// position ("Camera 1", "Camera 2", ...). The active selection survives
    /// if its device is still present.
    ///
    /// When the platform denies enumeration the list is cleared and nothing
    /// stays selected.
    pub fn enumerate(&mut self, backend: &dyn CameraBackend) -> Result<&[Device], CameraError> {
        let infos = match backend.enumerate_devices() {
            Ok(infos) => infos,
            Err(err) => {
                warn!(error = %err, "Device enumeration failed");
                self.devices.clear();
                self.active = None;
                return Err(err.into());
            }
        };

        let previous = self.active().map(|d| d.id.clone());
        self.devices = video_inputs(infos);
        self.active = previous.and_then(|id| self.position(&id));

        info!(count = self.devices.len(), "Enumerated cameras");
        Ok(&self.devices)
    }

    /// All known cameras in platform order
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// The active camera
    pub fn active(&self) -> Option<&Device> {
        self.active.and_then(|idx| self.devices.get(idx))
    }

    /// Mark a camera as active
    pub fn select(&mut self, id: &str) -> Result<&Device, CameraError> {
        let idx = self
            .position(id)
            .ok_or_else(|| CameraError::DeviceNotFound(id.to_string()))?;
        self.active = Some(idx);
        debug!(device = %id, "Camera selected");
        Ok(&self.devices[idx])
    }

    /// Forget the active selection
    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    /// Successor of the active camera (or of the first, if none is active)
    pub fn next(&self) -> Result<&Device, CameraError> {
        let current = self.active().map(|d| d.id.as_str()).unwrap_or_default();
        next_device(current, &self.devices)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.id == id)
    }
}

/// Cyclic successor of `current` in `devices`
///
/// Fewer than two devices is reported as [`CameraError::OnlyOneDevice`]; the
/// caller keeps its current camera. An unknown `current` maps to the first
/// device.
pub fn next_device<'a>(current: &str, devices: &'a [Device]) -> Result<&'a Device, CameraError> {
    if devices.len() < 2 {
        return Err(CameraError::OnlyOneDevice);
    }
    let next = match devices.iter().position(|d| d.id == current) {
        Some(idx) => (idx + 1) % devices.len(),
        None => 0,
    };
    Ok(&devices[next])
}

fn video_inputs(infos: Vec<MediaDeviceInfo>) -> Vec<Device> {
    infos
        .into_iter()
        .filter(|info| info.kind == DeviceKind::VideoInput)
        .enumerate()
        .map(|(index, info)| Device {
            label: if info.label.trim().is_empty() {
                format!("Camera {}", index + 1)
            } else {
                info.label
            },
            id: info.device_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str) -> Device {
        Device {
            id: id.to_string(),
            label: id.to_uppercase(),
        }
    }

    #[test]
    fn test_next_cycles() {
        let devices = vec![device("a"), device("b"), device("c")];
        assert_eq!(next_device("a", &devices).unwrap().id, "b");
        assert_eq!(next_device("b", &devices).unwrap().id, "c");
        assert_eq!(next_device("c", &devices).unwrap().id, "a");
    }

    #[test]
    fn test_next_needs_two_devices() {
        assert_eq!(
            next_device("a", &[device("a")]),
            Err(CameraError::OnlyOneDevice)
        );
        assert_eq!(next_device("a", &[]), Err(CameraError::OnlyOneDevice));
    }

    #[test]
    fn test_next_from_unknown_device_starts_at_first() {
        let devices = vec![device("a"), device("b")];
        assert_eq!(next_device("gone", &devices).unwrap().id, "a");
    }

    #[test]
    fn test_video_inputs_filter_and_labels() {
        let infos = vec![
            MediaDeviceInfo::video_input("/dev/video0", "Integrated Camera"),
            MediaDeviceInfo {
                device_id: "/dev/video1".into(),
                kind: DeviceKind::Other("metadata".into()),
                label: "Integrated Camera".into(),
            },
            MediaDeviceInfo::video_input("/dev/video2", ""),
        ];
        let devices = video_inputs(infos);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].label, "Integrated Camera");
        assert_eq!(devices[1].id, "/dev/video2");
        assert_eq!(devices[1].label, "Camera 2");
    }
}
