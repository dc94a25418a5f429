// SPDX-License-Identifier: MPL-2.0

//! Capture session
//!
//! # Architecture
//!
//! - `state`: Message, Task, request tokens, notices
//! - `gallery`: the ordered page collection
//! - `update`: message dispatch
//! - `handlers`: per-domain message handlers (camera, capture, gallery)
//! - `runtime`: drives a session on tokio, turning tasks into completions
//!
//! # Main Types
//!
//! - `SessionModel`: the whole session; mutated only by `update()`
//! - `Message`: user commands and I/O completions
//! - `Task`: I/O the session wants performed

pub mod gallery;
mod handlers;
pub mod runtime;
pub mod state;
mod update;

pub use gallery::{GallerySession, PageRecord};
pub use runtime::{Executor, SessionRuntime};
pub use state::{
    BlackFrameMonitor, CompileJob, ControlState, InFlight, Message, Notice, NoticeLevel,
    Operation, ProcessJob, RequestToken, Task,
};

use crate::backends::camera::{CameraBackend, CameraFrame, CaptureStream, Device, DeviceRegistry};
use crate::config::{CompileOrder, Config};
use crate::constants::{MAX_NOTICES, ResolutionHint, timing};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::{FilterMode, FrameEncoder, JpegQuality};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{error, info, warn};

/// Session preferences taken from the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub quality: JpegQuality,
    pub resolution: ResolutionHint,
    pub filter: FilterMode,
    pub compile_order: CompileOrder,
    /// Camera to start with, if it is present
    pub preferred_device: Option<String>,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self {
            quality: config.quality()?,
            resolution: config.resolution(),
            filter: config.scan_filter,
            compile_order: config.compile_order,
            preferred_device: config.last_camera_id.clone(),
        })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            quality: JpegQuality::default(),
            resolution: ResolutionHint::HIGH,
            filter: FilterMode::default(),
            compile_order: CompileOrder::default(),
            preferred_device: None,
        }
    }
}

/// One capture session
///
/// Owns the camera backend, the single live stream, the gallery and the
/// outstanding-request slots. All transitions go through
/// [`SessionModel::update`], one message at a time.
pub struct SessionModel {
    pub(crate) backend: Box<dyn CameraBackend>,
    pub(crate) registry: DeviceRegistry,
    pub(crate) stream: CaptureStream,
    pub(crate) encoder: FrameEncoder,
    pub(crate) gallery: GallerySession,
    pub(crate) filter: FilterMode,
    pub(crate) compile_order: CompileOrder,
    pub(crate) preferred_device: Option<String>,
    pub(crate) in_flight: InFlight,
    pub(crate) black_frames: BlackFrameMonitor,
    pub(crate) capture_flash: Option<Instant>,
    notices: VecDeque<Notice>,
}

impl SessionModel {
    pub fn new(backend: Box<dyn CameraBackend>, settings: SessionSettings) -> Self {
        info!(
            backend = %backend.backend_type(),
            resolution = %settings.resolution,
            filter = settings.filter.as_str(),
            "Creating capture session"
        );
        Self {
            backend,
            registry: DeviceRegistry::new(),
            stream: CaptureStream::new(settings.resolution),
            encoder: FrameEncoder::new(settings.quality),
            gallery: GallerySession::new(),
            filter: settings.filter,
            compile_order: settings.compile_order,
            preferred_device: settings.preferred_device,
            in_flight: InFlight::default(),
            black_frames: BlackFrameMonitor::default(),
            capture_flash: None,
            notices: VecDeque::new(),
        }
    }

    // ===== Read access =====

    pub fn devices(&self) -> &[Device] {
        self.registry.devices()
    }

    pub fn active_device(&self) -> Option<&Device> {
        self.registry.active()
    }

    pub fn stream(&self) -> &CaptureStream {
        &self.stream
    }

    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.stream.latest_frame()
    }

    pub fn gallery(&self) -> &GallerySession {
        &self.gallery
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.in_flight.is_busy(op)
    }

    /// Capture flash is still showing
    pub fn is_flashing(&self) -> bool {
        self.capture_flash
            .is_some_and(|at| at.elapsed() < timing::CAPTURE_FLASH)
    }

    /// Derived control availability
    pub fn controls(&self) -> ControlState {
        let capture_busy = self.in_flight.is_busy(Operation::Capture);
        let compile_busy = self.in_flight.is_busy(Operation::Compile);
        ControlState {
            capture_enabled: self.stream.is_live() && !capture_busy,
            capture_busy,
            compile_enabled: self.gallery.can_compile() && !compile_busy,
            compile_busy,
            page_count: self.gallery.page_count(),
            empty: self.gallery.is_empty(),
        }
    }

    // ===== Notices =====

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Remove and return all pending notices, oldest first
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice::new(level, message);
        info!(level = ?notice.level, message = %notice.message, "Notice");
        self.push_notice(notice);
    }

    /// Turn a failure into a notice
    pub(crate) fn report(&mut self, err: AppError) {
        match err.level() {
            NoticeLevel::Error => error!(error = %err, "Session error"),
            _ => warn!(error = %err, "Session warning"),
        }
        self.push_notice(Notice::from(&err));
    }

    fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() >= MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}

impl std::fmt::Debug for SessionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionModel")
            .field("backend", &self.backend.backend_type())
            .field("registry", &self.registry)
            .field("stream", &self.stream)
            .field("pages", &self.gallery.page_count())
            .field("filter", &self.filter)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
