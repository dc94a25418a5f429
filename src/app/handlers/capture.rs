// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles filter selection, frame capture and processing results.

use crate::app::SessionModel;
use crate::app::state::{NoticeLevel, Operation, ProcessJob, RequestToken, Task};
use crate::errors::{AppError, CameraError, RemoteError};
use crate::pipelines::photo::FilterMode;
use crate::remote::ProcessOutcome;
use std::time::Instant;
use tracing::{debug, info, warn};

impl SessionModel {
    // =========================================================================
    // Capture Operations Handlers
    // =========================================================================

    pub(crate) fn handle_set_filter(&mut self, filter: FilterMode) -> Task {
        if self.filter != filter {
            info!(filter = filter.as_str(), "Scan filter changed");
            self.filter = filter;
        }
        Task::none()
    }

    /// Snapshot the live frame and request processing
    ///
    /// Ignored while a capture is outstanding.
    pub(crate) fn handle_capture(&mut self) -> Task {
        if self.in_flight.is_busy(Operation::Capture) {
            debug!("Capture ignored, previous frame still processing");
            return Task::none();
        }

        let Some(handle) = self.stream.handle() else {
            self.report(CameraError::NoLiveStream.into());
            return Task::none();
        };

        let frame = match self.encoder.capture(handle, self.filter) {
            Ok(frame) => frame,
            Err(err) => {
                self.report(err.into());
                return Task::none();
            }
        };

        let token = match self.in_flight.begin(Operation::Capture) {
            Ok(token) => token,
            Err(err) => {
                debug!(error = %err, "Capture slot taken");
                return Task::none();
            }
        };

        info!(%token, "Capturing...");
        self.capture_flash = Some(Instant::now());
        Task::Process(ProcessJob { token, frame })
    }

    pub(crate) fn handle_processed(
        &mut self,
        token: RequestToken,
        result: Result<ProcessOutcome, RemoteError>,
    ) -> Task {
        if !self.in_flight.finish(Operation::Capture, token) {
            warn!(%token, "Ignoring stale processing result");
            return Task::none();
        }

        match result {
            Ok(outcome) => {
                info!(
                    filename = %outcome.record.filename,
                    detected = outcome.record.detected,
                    "Page processed"
                );
                self.gallery.add(outcome.record);
                if outcome.low_confidence {
                    self.notify(
                        NoticeLevel::Warning,
                        "No document detected - saved full frame",
                    );
                } else {
                    self.notify(NoticeLevel::Success, "Document scanned successfully!");
                }
            }
            Err(err) => self.report(AppError::Remote(err)),
        }
        Task::none()
    }
}
