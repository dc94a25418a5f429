// SPDX-License-Identifier: GPL-3.0-only

//! Live stream lifecycle
//!
//! `Idle -> Starting -> Live -> Idle` on stop, `Live -> Starting -> Live` on
//! a device switch. Only one handle ever exists: the old one is stopped (and
//! its device closed) before the backend is asked for the next.

use super::types::{CameraFrame, StreamConstraints};
use super::{CameraBackend, LiveStream};
use crate::constants::ResolutionHint;
use crate::errors::CameraError;
use tracing::{info, warn};

/// Observable stream state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Starting,
    Live,
}

enum StreamState {
    Idle,
    Starting,
    Live(Box<dyn LiveStream>),
}

/// Owner of the single live camera handle
pub struct CaptureStream {
    state: StreamState,
    resolution: ResolutionHint,
}

impl CaptureStream {
    /// Create an idle stream that will request `resolution` when started
    pub fn new(resolution: ResolutionHint) -> Self {
        Self {
            state: StreamState::Idle,
            resolution,
        }
    }

    /// Start streaming from `device_id`
    ///
    /// Any live handle is released first. On failure the stream is left Idle.
    pub fn start(
        &mut self,
        backend: &mut dyn CameraBackend,
        device_id: &str,
    ) -> Result<(), CameraError> {
        self.stop();
        self.state = StreamState::Starting;

        let constraints = StreamConstraints {
            device_id: device_id.to_string(),
            ideal_width: self.resolution.width,
            ideal_height: self.resolution.height,
        };

        match backend.open_stream(&constraints) {
            Ok(handle) => {
                let (width, height) = handle.resolution();
                info!(device = %device_id, width, height, "Camera stream live");
                self.state = StreamState::Live(handle);
                Ok(())
            }
            Err(err) => {
                warn!(device = %device_id, error = %err, "Failed to start camera");
                self.state = StreamState::Idle;
                Err(err.into())
            }
        }
    }

    /// Release the live handle, if any
    pub fn stop(&mut self) {
        if let StreamState::Live(mut handle) = std::mem::replace(&mut self.state, StreamState::Idle)
        {
            info!(device = %handle.device_id(), "Stopping camera stream");
            handle.stop();
        }
    }

    pub fn phase(&self) -> StreamPhase {
        match self.state {
            StreamState::Idle => StreamPhase::Idle,
            StreamState::Starting => StreamPhase::Starting,
            StreamState::Live(_) => StreamPhase::Live,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, StreamState::Live(_))
    }

    /// The live handle
    pub fn handle(&self) -> Option<&dyn LiveStream> {
        match &self.state {
            StreamState::Live(handle) => Some(handle.as_ref()),
            _ => None,
        }
    }

    /// Device of the live handle
    pub fn device_id(&self) -> Option<&str> {
        self.handle().map(|h| h.device_id())
    }

    /// Latest frame of the live handle
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.handle().and_then(|h| h.latest_frame())
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStream")
            .field("phase", &self.phase())
            .field("device", &self.device_id())
            .field("resolution", &self.resolution)
            .finish()
    }
}
