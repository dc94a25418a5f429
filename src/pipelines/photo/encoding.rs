// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding of captured frames
//!
//! Frames are encoded at native resolution. The result travels to the
//! processing service as a base64 data URI.

use super::filter::FilterMode;
use crate::backends::camera::types::CameraFrame;
use crate::errors::CameraError;
use base64::Engine;
use tracing::debug;

/// JPEG quality as a fraction in (0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JpegQuality(f32);

impl JpegQuality {
    /// Validate a quality fraction
    pub fn new(quality: f32) -> Result<Self, String> {
        if quality.is_finite() && quality > 0.0 && quality <= 1.0 {
            Ok(Self(quality))
        } else {
            Err(format!("JPEG quality must be in (0, 1], got {}", quality))
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Quality value for the JPEG encoder (1-100)
    pub fn to_u8(&self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_JPEG_QUALITY)
    }
}

/// An encoded still, ready to be sent for processing
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// JPEG bytes
    pub encoded: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Filter to request with this frame
    pub filter: FilterMode,
}

impl CapturedFrame {
    /// `data:image/jpeg;base64,...` form of the payload
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.encoded)
        )
    }
}

/// Encode a frame as JPEG
pub fn encode_jpeg(frame: &CameraFrame, quality: JpegQuality) -> Result<Vec<u8>, CameraError> {
    let image = frame
        .to_rgb_image()
        .ok_or_else(|| CameraError::EncodingFailed("frame buffer too short".to_string()))?;

    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.to_u8());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CameraError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    debug!(size = buffer.len(), quality = quality.to_u8(), "Encoding complete");
    Ok(buffer)
}
