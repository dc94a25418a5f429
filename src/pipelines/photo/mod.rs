// SPDX-License-Identifier: MPL-2.0

//! Photo capture pipeline
//!
//! ```text
//! LiveStream → Grab → JPEG Encoding → CapturedFrame → processing service
//!      ↓
//! Preview continues uninterrupted
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Grab**: Copy the latest frame from the live stream
//! 2. **Encoding**: JPEG at native resolution with the configured quality
//!
//! Filtering and document detection happen on the server; the chosen
//! [`FilterMode`] only rides along with the frame.

pub mod capture;
pub mod encoding;
pub mod filter;

pub use capture::FrameCapture;
pub use encoding::{CapturedFrame, JpegQuality, encode_jpeg};
pub use filter::FilterMode;

use crate::backends::camera::LiveStream;
use crate::backends::camera::types::CameraFrame;
use crate::errors::CameraError;
use tracing::info;

/// Turns live frames into transportable stills
#[derive(Debug, Clone, Default)]
pub struct FrameEncoder {
    quality: JpegQuality,
}

impl FrameEncoder {
    pub fn new(quality: JpegQuality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> JpegQuality {
        self.quality
    }

    /// Snapshot the current frame of `stream` and encode it
    pub fn capture(
        &self,
        stream: &dyn LiveStream,
        filter: FilterMode,
    ) -> Result<CapturedFrame, CameraError> {
        let frame = FrameCapture::grab(stream)?;
        self.encode(&frame, filter)
    }

    /// Encode an already grabbed frame
    pub fn encode(
        &self,
        frame: &CameraFrame,
        filter: FilterMode,
    ) -> Result<CapturedFrame, CameraError> {
        let encoded = encode_jpeg(frame, self.quality)?;
        info!(
            width = frame.width,
            height = frame.height,
            bytes = encoded.len(),
            %filter,
            "Frame captured"
        );
        Ok(CapturedFrame {
            encoded,
            width: frame.width,
            height: frame.height,
            filter,
        })
    }
}
