// SPDX-License-Identifier: MPL-2.0

//! Frame grabbing from the live stream
//!
//! Takes a copy of the most recent frame without interrupting the stream.

use crate::backends::camera::LiveStream;
use crate::backends::camera::types::CameraFrame;
use crate::errors::CameraError;
use tracing::debug;

/// Snapshot handler for a live stream
pub struct FrameCapture;

impl FrameCapture {
    /// Grab the latest frame of `stream`
    ///
    /// The frame data is reference counted; the capture thread keeps running
    /// while the caller encodes it.
    pub fn grab(stream: &dyn LiveStream) -> Result<CameraFrame, CameraError> {
        let frame = stream
            .latest_frame()
            .ok_or(CameraError::NoFrameAvailable)?;

        if frame.width == 0 || frame.height == 0 {
            return Err(CameraError::NoFrameAvailable);
        }

        debug!(
            device = %stream.device_id(),
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Frame grabbed from stream"
        );

        Ok(frame)
    }
}
