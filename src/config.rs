// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraBackendType;
use crate::constants::{APP_ID, DEFAULT_JPEG_QUALITY, DEFAULT_SERVER_URL, ResolutionHint};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{FilterMode, JpegQuality};
use crate::remote::DownloadAction;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Order of the page list sent for compilation
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileOrder {
    /// Gallery order, most recent page first
    #[default]
    Gallery,
    /// Capture order, oldest page first
    Capture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the processing service
    pub server_url: String,
    /// Camera backend to use (V4L2 or still images)
    pub backend: CameraBackendType,
    /// Last used camera device id
    pub last_camera_id: Option<String>,
    /// Filter requested for new captures
    pub scan_filter: FilterMode,
    /// JPEG quality in (0, 1]
    pub jpeg_quality: f32,
    /// Request 1920x1080 instead of 640x480
    pub high_quality: bool,
    /// Mirror camera preview horizontally
    pub mirror_preview: bool,
    /// Page order for compilation
    pub compile_order: CompileOrder,
    /// Save or open the compiled document
    pub download_action: DownloadAction,
    /// Where saved documents go (user download dir when unset)
    pub download_dir: Option<PathBuf>,
    /// Per-request timeout; requests may stay outstanding when unset
    pub request_timeout_secs: Option<u64>,
    /// Image files used by the still-image backend
    pub still_images: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            backend: CameraBackendType::default(),
            last_camera_id: None,
            scan_filter: FilterMode::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            high_quality: true,
            mirror_preview: false,
            compile_order: CompileOrder::default(),
            download_action: DownloadAction::default(),
            download_dir: None,
            request_timeout_secs: None,
            still_images: Vec::new(),
        }
    }
}

impl Config {
    /// Default location: `<config dir>/scan-camera/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join("config.json"))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(AppError::Config(format!("{}: {}", path.display(), e))),
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Write to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Reject values that would fail later at capture time
    pub fn validate(&self) -> AppResult<()> {
        JpegQuality::new(self.jpeg_quality).map_err(AppError::Config)?;
        if self.server_url.trim().is_empty() {
            return Err(AppError::Config("server_url is empty".to_string()));
        }
        Ok(())
    }

    /// Validated JPEG quality
    pub fn quality(&self) -> AppResult<JpegQuality> {
        JpegQuality::new(self.jpeg_quality).map_err(AppError::Config)
    }

    /// Resolution requested when a stream starts
    pub fn resolution(&self) -> ResolutionHint {
        ResolutionHint::for_quality(self.high_quality)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
