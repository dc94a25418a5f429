// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Processing service address used when nothing is configured
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Application identifier (config directory name)
pub const APP_ID: &str = "scan-camera";

/// Default JPEG quality for captured frames, in (0, 1]
pub const DEFAULT_JPEG_QUALITY: f32 = 0.9;

/// Number of notices kept before the oldest are dropped
pub const MAX_NOTICES: usize = 32;

/// Remote endpoint paths, relative to the server base URL
pub mod endpoints {
    /// Frame processing (document detection + filter)
    pub const PROCESS: &str = "process";
    /// PDF compilation of the ordered page list
    pub const COMPILE: &str = "compile";
    /// Server-side scratch cleanup
    pub const CLEANUP: &str = "cleanup";
}

/// Resolution hints passed to the camera when a stream starts
///
/// These are ideals, not requirements: the backend picks the closest mode
/// the device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionHint {
    pub width: u32,
    pub height: u32,
}

impl ResolutionHint {
    /// Full HD, used when high quality capture is enabled
    pub const HIGH: ResolutionHint = ResolutionHint {
        width: 1920,
        height: 1080,
    };

    /// VGA, used when high quality capture is disabled
    pub const STANDARD: ResolutionHint = ResolutionHint {
        width: 640,
        height: 480,
    };

    /// Pick the hint for the high-quality setting
    pub fn for_quality(high_quality: bool) -> Self {
        if high_quality {
            Self::HIGH
        } else {
            Self::STANDARD
        }
    }

    /// Total pixel count
    pub fn pixels(&self) -> u32 {
        self.width * self.height
    }
}

impl std::fmt::Display for ResolutionHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// UI timing constants
pub mod timing {
    use super::Duration;

    /// How long a notice stays on screen
    pub const NOTICE_DISPLAY: Duration = Duration::from_secs(3);

    /// Length of the white flash shown when a frame is captured
    pub const CAPTURE_FLASH: Duration = Duration::from_millis(150);

    /// Input poll interval for the terminal front-end (~60 fps)
    pub const TERMINAL_POLL: Duration = Duration::from_millis(16);

    /// Maximum wait for the first frame when probing a camera
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

    /// Frames to skip while the sensor settles during a probe
    pub const PROBE_WARMUP: Duration = Duration::from_millis(500);
}

/// V4L2 streaming constants
pub mod streaming {
    use super::Duration;

    /// Number of memory-mapped buffers queued with the driver
    pub const BUFFER_COUNT: u32 = 4;

    /// Dequeue timeout so the capture thread notices a stop request
    pub const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(200);
}

/// Black screen detection (virtual cameras often stream black frames)
pub mod black_frame {
    /// Preview mean luma below which a frame counts as black
    pub const PREVIEW_MEAN_THRESHOLD: f32 = 10.0;

    /// Consecutive black preview frames before warning
    pub const PREVIEW_FRAME_COUNT: u32 = 30;

    /// Probe mean luma below which a camera is reported as black
    pub const PROBE_MEAN_THRESHOLD: f32 = 5.0;
}

/// File format constants
pub mod file_formats {
    /// Supported image file extensions for still-image cameras
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }

    /// Fallback name for a downloaded document without a usable URL segment
    pub const FALLBACK_DOCUMENT_PREFIX: &str = "Compiled_Doc";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_for_quality() {
        assert_eq!(ResolutionHint::for_quality(true), ResolutionHint::HIGH);
        assert_eq!(ResolutionHint::for_quality(false), ResolutionHint::STANDARD);
        assert!(ResolutionHint::HIGH.pixels() > ResolutionHint::STANDARD.pixels());
    }

    #[test]
    fn test_image_extensions() {
        assert!(file_formats::is_image_extension("JPG"));
        assert!(file_formats::is_image_extension("png"));
        assert!(!file_formats::is_image_extension("mp4"));
    }
}
