// SPDX-License-Identifier: GPL-3.0-only

//! Session state types
//!
//! Messages flow into [`crate::app::SessionModel::update`]; the I/O it
//! requests comes back out as a [`Task`]. Completions re-enter as messages
//! that carry the [`RequestToken`] of the request they answer.

use crate::constants::black_frame;
use crate::errors::{AppError, RemoteError};
use crate::pipelines::photo::{CapturedFrame, FilterMode};
use crate::remote::{CompileResult, DownloadOutcome, ProcessOutcome};
use std::fmt;
use std::time::Instant;

/// Every event the session reacts to
#[derive(Debug, Clone)]
pub enum Message {
    // ===== Camera =====
    /// Enumerate cameras and start the preferred one
    Init,
    /// Re-read the camera list without touching the stream
    RefreshDevices,
    /// Switch to a specific camera
    SelectDevice(String),
    /// Switch to the next camera in the list
    FlipCamera,
    /// Release the camera
    StopCamera,
    /// Mean luma of the frame just shown in the preview
    PreviewFrame { mean_luma: f32 },

    // ===== Capture =====
    /// Choose the filter for subsequent captures
    SetFilter(FilterMode),
    /// Advance to the next filter
    CycleFilter,
    /// Snapshot the live frame and send it for processing
    Capture,
    /// Processing request finished
    Processed {
        token: RequestToken,
        result: Result<ProcessOutcome, RemoteError>,
    },
    /// End of the capture flash
    ClearCaptureFlash,

    // ===== Gallery =====
    /// Remove the page with this filename
    RemovePage(String),
    /// Compile the gallery into a document
    Compile,
    /// Compile request finished
    Compiled {
        token: RequestToken,
        result: Result<CompileResult, RemoteError>,
    },
    /// Download of the compiled document finished
    Downloaded(Result<DownloadOutcome, RemoteError>),
}

/// I/O requested by the session
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    None,
    /// Submit a frame to the processing service
    Process(ProcessJob),
    /// Request compilation of a page list
    Compile(CompileJob),
    /// Fetch or open the compiled document
    Download(String),
}

impl Task {
    pub fn none() -> Self {
        Task::None
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Task::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessJob {
    pub token: RequestToken,
    pub frame: CapturedFrame,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    pub token: RequestToken,
    /// Snapshot taken when the compile was requested
    pub filenames: Vec<String>,
}

/// Operations that allow one outstanding request each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Capture,
    Compile,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Capture => write!(f, "Capture"),
            Operation::Compile => write!(f, "Compilation"),
        }
    }
}

/// Identity of one outstanding request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outstanding request slots, one per [`Operation`]
#[derive(Debug, Default)]
pub struct InFlight {
    next: u64,
    capture: Option<RequestToken>,
    compile: Option<RequestToken>,
}

impl InFlight {
    /// Claim the slot for `op`
    pub fn begin(&mut self, op: Operation) -> Result<RequestToken, AppError> {
        if self.is_busy(op) {
            return Err(AppError::Busy(op));
        }
        self.next += 1;
        let token = RequestToken(self.next);
        *self.slot_mut(op) = Some(token);
        Ok(token)
    }

    /// Release the slot if `token` is the one holding it
    pub fn finish(&mut self, op: Operation, token: RequestToken) -> bool {
        let slot = self.slot_mut(op);
        if *slot == Some(token) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.token(op).is_some()
    }

    pub fn token(&self, op: Operation) -> Option<RequestToken> {
        match op {
            Operation::Capture => self.capture,
            Operation::Compile => self.compile,
        }
    }

    fn slot_mut(&mut self, op: Operation) -> &mut Option<RequestToken> {
        match op {
            Operation::Capture => &mut self.capture,
            Operation::Compile => &mut self.compile,
        }
    }
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient user-facing notification
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: Instant,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Instant::now(),
        }
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        Notice::new(err.level(), err.notice_message())
    }
}

/// Derived control availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub capture_enabled: bool,
    pub capture_busy: bool,
    pub compile_enabled: bool,
    pub compile_busy: bool,
    pub page_count: usize,
    pub empty: bool,
}

/// Detects a camera that streams only black frames
#[derive(Debug, Default)]
pub struct BlackFrameMonitor {
    dark_streak: u32,
    warned: bool,
}

impl BlackFrameMonitor {
    /// Record one preview frame; true when the warning should be raised
    pub fn observe(&mut self, mean_luma: f32) -> bool {
        if mean_luma < black_frame::PREVIEW_MEAN_THRESHOLD {
            self.dark_streak = self.dark_streak.saturating_add(1);
        } else {
            self.dark_streak = 0;
            self.warned = false;
        }

        if self.dark_streak > black_frame::PREVIEW_FRAME_COUNT && !self.warned {
            self.warned = true;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_warning(&self) -> bool {
        self.warned
    }
}
