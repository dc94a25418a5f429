// SPDX-License-Identifier: GPL-3.0-only

//! Camera control handlers
//!
//! Handles enumeration, selection, switching and the black-frame monitor.
//! Every switch goes through [`SessionModel::start_device`], which relies on
//! `CaptureStream::start` releasing the old device before opening the new.

use crate::app::SessionModel;
use crate::app::state::{NoticeLevel, Task};
use crate::errors::{AppError, CameraError};
use tracing::{debug, info, warn};

impl SessionModel {
    // =========================================================================
    // Camera Control Handlers
    // =========================================================================

    pub(crate) fn handle_init(&mut self) -> Task {
        if let Err(err) = self.enumerate_devices() {
            self.stream.stop();
            self.report(err);
            return Task::none();
        }

        if self.registry.devices().is_empty() {
            self.stream.stop();
            self.report(CameraError::NoCameraFound.into());
            return Task::none();
        }

        let preferred = self
            .preferred_device
            .as_deref()
            .filter(|id| self.registry.devices().iter().any(|d| d.id == *id))
            .map(str::to_string);
        let target = match preferred {
            Some(id) => id,
            None => self.registry.devices()[0].id.clone(),
        };

        info!(device = %target, "Starting initial camera");
        self.start_device(target);
        Task::none()
    }

    pub(crate) fn handle_refresh_devices(&mut self) -> Task {
        if let Err(err) = self.enumerate_devices() {
            self.stream.stop();
            self.report(err);
            return Task::none();
        }

        // The live device may have disappeared
        if let Some(live) = self.stream.device_id().map(str::to_string) {
            if self.registry.active().is_none_or(|d| d.id != live) {
                warn!(device = %live, "Live camera no longer listed, stopping");
                self.stream.stop();
            }
        }
        Task::none()
    }

    pub(crate) fn handle_select_device(&mut self, id: String) -> Task {
        if self.stream.device_id() == Some(id.as_str()) {
            debug!(device = %id, "Camera already active");
            return Task::none();
        }
        if let Err(err) = self.registry.select(&id) {
            self.report(err.into());
            return Task::none();
        }
        self.start_device(id);
        Task::none()
    }

    pub(crate) fn handle_flip_camera(&mut self) -> Task {
        // Pick up cameras plugged in since the last enumeration
        if let Err(err) = self.enumerate_devices() {
            self.stream.stop();
            self.report(err);
            return Task::none();
        }

        match self.registry.next() {
            Ok(next) => {
                let id = next.id.clone();
                info!(device = %id, label = %next.label, "Switching camera");
                self.start_device(id);
            }
            Err(err) => self.report(err.into()),
        }
        Task::none()
    }

    pub(crate) fn handle_stop_camera(&mut self) -> Task {
        self.stream.stop();
        self.black_frames.reset();
        Task::none()
    }

    pub(crate) fn handle_preview_frame(&mut self, mean_luma: f32) -> Task {
        if self.black_frames.observe(mean_luma) {
            warn!(mean_luma, "Camera is streaming black frames");
            self.notify(
                NoticeLevel::Warning,
                "Black screen detected, check the camera",
            );
        }
        Task::none()
    }

    /// Enumerate through the registry, mapping failures for reporting
    fn enumerate_devices(&mut self) -> Result<(), AppError> {
        self.registry
            .enumerate(self.backend.as_ref())
            .map(|devices| debug!(count = devices.len(), "Devices enumerated"))
            .map_err(AppError::from)
    }

    /// Make `id` the live camera
    ///
    /// On failure the stream is idle, nothing is selected and the error is
    /// reported. The gallery is never touched.
    pub(crate) fn start_device(&mut self, id: String) {
        self.black_frames.reset();
        match self.stream.start(self.backend.as_mut(), &id) {
            Ok(()) => {
                if let Err(err) = self.registry.select(&id) {
                    warn!(device = %id, error = %err, "Started camera is not in the registry");
                }
                self.preferred_device = Some(id);
            }
            Err(err) => {
                self.registry.clear_selection();
                self.report(err.into());
            }
        }
    }
}
