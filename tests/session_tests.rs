// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture session state machine
//!
//! These drive `SessionModel::update` directly with in-memory cameras and
//! hand-made completions, so no server is needed.

use scan_camera::app::{
    Message, NoticeLevel, Operation, PageRecord, SessionModel, SessionSettings, Task,
};
use scan_camera::backends::camera::still::StillImageBackend;
use scan_camera::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraBackendType, CameraFrame, LiveStream,
    MediaDeviceInfo, PixelFormat, StreamConstraints,
};
use scan_camera::errors::RemoteError;
use scan_camera::pipelines::photo::FilterMode;
use scan_camera::remote::{CompileResult, ProcessOutcome};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn gray_frame(value: u8) -> CameraFrame {
    CameraFrame::new(8, 8, PixelFormat::Gray8, vec![value; 64])
}

fn still_session(ids: &[&str]) -> SessionModel {
    let frames = ids
        .iter()
        .map(|id| (id.to_string(), format!("Camera {}", id), gray_frame(128)))
        .collect();
    SessionModel::new(
        Box::new(StillImageBackend::from_frames(frames)),
        SessionSettings::default(),
    )
}

fn page(name: &str, detected: bool) -> ProcessOutcome {
    ProcessOutcome {
        record: PageRecord {
            filename: name.to_string(),
            url: format!("/static/processed/{}", name),
            detected,
        },
        low_confidence: !detected,
    }
}

/// Capture and complete it with `result`
fn capture_with(model: &mut SessionModel, result: Result<ProcessOutcome, RemoteError>) {
    let Task::Process(job) = model.update(Message::Capture) else {
        panic!("capture should produce a processing task");
    };
    let task = model.update(Message::Processed {
        token: job.token,
        result,
    });
    assert!(task.is_none());
}

/// Backend that counts live handles and records every open request
#[derive(Clone, Default)]
struct RecordingBackend {
    devices: Vec<MediaDeviceInfo>,
    deny: bool,
    failing: Vec<String>,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingBackend {
    fn with_devices(ids: &[&str]) -> Self {
        Self {
            devices: ids
                .iter()
                .map(|id| MediaDeviceInfo::video_input(*id, ""))
                .collect(),
            ..Self::default()
        }
    }
}

impl CameraBackend for RecordingBackend {
    fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>> {
        if self.deny {
            return Err(BackendError::PermissionDenied("denied".into()));
        }
        Ok(self.devices.clone())
    }

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn LiveStream>> {
        self.opened
            .lock()
            .unwrap()
            .push(constraints.device_id.clone());
        if self.failing.contains(&constraints.device_id) {
            return Err(BackendError::AcquisitionFailed("busy".into()));
        }
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(RecordingStream {
            device_id: constraints.device_id.clone(),
            live: Arc::clone(&self.live),
            active: true,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Still
    }
}

struct RecordingStream {
    device_id: String,
    live: Arc<AtomicUsize>,
    active: bool,
}

impl LiveStream for RecordingStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn resolution(&self) -> (u32, u32) {
        (8, 8)
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        self.active.then(|| gray_frame(200))
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[test]
fn test_init_starts_first_camera() {
    let mut model = still_session(&["A", "B"]);
    assert!(model.update(Message::Init).is_none());

    assert_eq!(model.devices().len(), 2);
    assert_eq!(model.active_device().map(|d| d.id.as_str()), Some("A"));
    assert!(model.stream().is_live());
    assert!(model.controls().capture_enabled);
}

#[test]
fn test_init_prefers_remembered_camera() {
    let backend = RecordingBackend::with_devices(&["A", "B"]);
    let settings = SessionSettings {
        preferred_device: Some("B".into()),
        ..SessionSettings::default()
    };
    let mut model = SessionModel::new(Box::new(backend), settings);
    model.update(Message::Init);
    assert_eq!(model.stream().device_id(), Some("B"));
}

#[test]
fn test_permission_denied_leaves_no_active_device() {
    let backend = RecordingBackend {
        deny: true,
        ..RecordingBackend::with_devices(&["A"])
    };
    let mut model = SessionModel::new(Box::new(backend), SessionSettings::default());
    model.update(Message::Init);

    assert!(model.active_device().is_none());
    assert!(!model.stream().is_live());
    assert!(!model.controls().capture_enabled);

    let notices = model.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(
        notices[0].message,
        "Camera permission denied or not available."
    );
}

#[test]
fn test_no_cameras_reported() {
    let backend = RecordingBackend::with_devices(&[]);
    let mut model = SessionModel::new(Box::new(backend), SessionSettings::default());
    model.update(Message::Init);

    assert!(model.active_device().is_none());
    let notices = model.take_notices();
    assert_eq!(notices[0].message, "No cameras found.");
}

#[test]
fn test_unlabelled_devices_are_numbered() {
    let backend = RecordingBackend::with_devices(&["/dev/video0", "/dev/video2"]);
    let mut model = SessionModel::new(Box::new(backend), SessionSettings::default());
    model.update(Message::Init);

    let labels: Vec<_> = model.devices().iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["Camera 1", "Camera 2"]);
}

#[test]
fn test_flip_cycles_and_keeps_one_live_handle() {
    let backend = RecordingBackend::with_devices(&["A", "B"]);
    let live = Arc::clone(&backend.live);
    let max_live = Arc::clone(&backend.max_live);
    let mut model = SessionModel::new(Box::new(backend), SessionSettings::default());

    model.update(Message::Init);
    model.update(Message::FlipCamera);
    assert_eq!(model.active_device().map(|d| d.id.as_str()), Some("B"));
    model.update(Message::FlipCamera);
    assert_eq!(model.active_device().map(|d| d.id.as_str()), Some("A"));

    assert_eq!(live.load(Ordering::SeqCst), 1);
    assert_eq!(max_live.load(Ordering::SeqCst), 1);

    model.update(Message::StopCamera);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_flip_with_one_camera_keeps_stream() {
    let backend = RecordingBackend::with_devices(&["A"]);
    let opened = Arc::clone(&backend.opened);
    let mut model = SessionModel::new(Box::new(backend), SessionSettings::default());
    model.update(Message::Init);
    model.take_notices();

    model.update(Message::FlipCamera);
    assert_eq!(model.stream().device_id(), Some("A"));
    assert_eq!(opened.lock().unwrap().len(), 1);

    let notices = model.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, "Only one camera found");
}

#[test]
fn test_failed_switch_leaves_session_idle_with_gallery_intact() {
    let backend = RecordingBackend {
        failing: vec!["B".into()],
        ..RecordingBackend::with_devices(&["A", "B"])
    };
    let live = Arc::clone(&backend.live);
    let mut model = SessionModel::new(Box::new(backend), SessionSettings::default());
    model.update(Message::Init);
    capture_with(&mut model, Ok(page("p1.jpg", true)));

    model.update(Message::SelectDevice("B".into()));

    assert!(!model.stream().is_live());
    assert!(model.active_device().is_none());
    assert_eq!(live.load(Ordering::SeqCst), 0);
    assert_eq!(model.gallery().page_count(), 1);
}

#[test]
fn test_select_unknown_device_keeps_current() {
    let mut model = still_session(&["A", "B"]);
    model.update(Message::Init);
    model.take_notices();

    model.update(Message::SelectDevice("Z".into()));
    assert_eq!(model.stream().device_id(), Some("A"));
    assert_eq!(model.take_notices().len(), 1);
}

#[test]
fn test_capture_without_stream_is_reported() {
    let mut model = still_session(&["A"]);
    assert!(model.update(Message::Capture).is_none());
    assert_eq!(model.take_notices()[0].level, NoticeLevel::Error);
}

#[test]
fn test_capture_carries_selected_filter() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    model.update(Message::SetFilter(FilterMode::Gray));

    let Task::Process(job) = model.update(Message::Capture) else {
        panic!("expected a processing task");
    };
    assert_eq!(job.frame.filter, FilterMode::Gray);
    assert_eq!((job.frame.width, job.frame.height), (8, 8));
    assert_eq!(&job.frame.encoded[..2], &[0xFF, 0xD8]);
    assert!(model.is_flashing());
}

#[test]
fn test_capture_while_busy_produces_no_task() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);

    assert!(matches!(model.update(Message::Capture), Task::Process(_)));
    assert!(model.is_busy(Operation::Capture));
    assert!(model.update(Message::Capture).is_none());
    assert!(!model.controls().capture_enabled);
    assert!(model.controls().capture_busy);
}

#[test]
fn test_stale_processing_result_is_ignored() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);

    let Task::Process(first) = model.update(Message::Capture) else {
        panic!("expected a processing task");
    };
    model.update(Message::Processed {
        token: first.token,
        result: Ok(page("p1.jpg", true)),
    });

    let Task::Process(second) = model.update(Message::Capture) else {
        panic!("expected a processing task");
    };
    model.update(Message::Processed {
        token: first.token,
        result: Ok(page("dup.jpg", true)),
    });
    assert_eq!(model.gallery().page_count(), 1);
    assert!(model.is_busy(Operation::Capture));

    model.update(Message::Processed {
        token: second.token,
        result: Ok(page("p2.jpg", true)),
    });
    assert_eq!(model.gallery().page_count(), 2);
    assert!(!model.is_busy(Operation::Capture));
}

#[test]
fn test_undetected_page_is_added_with_warning() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    model.take_notices();

    capture_with(&mut model, Ok(page("full.jpg", false)));

    assert_eq!(model.gallery().page_count(), 1);
    assert!(!model.gallery().get(0).unwrap().detected);
    let notices = model.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
}

#[test]
fn test_rejected_processing_adds_nothing() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    model.take_notices();

    capture_with(
        &mut model,
        Err(RemoteError::Processing("No image data provided".into())),
    );

    assert!(model.gallery().is_empty());
    assert!(!model.is_busy(Operation::Capture));
    let notices = model.take_notices();
    assert_eq!(notices[0].message, "Processing failed: No image data provided");
}

#[test]
fn test_compile_requests_download_and_keeps_gallery() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    capture_with(&mut model, Ok(page("p1.jpg", true)));
    capture_with(&mut model, Ok(page("p2.jpg", true)));

    let Task::Compile(job) = model.update(Message::Compile) else {
        panic!("expected a compile task");
    };
    // Most recent first
    assert_eq!(job.filenames, vec!["p2.jpg", "p1.jpg"]);
    assert!(model.update(Message::Compile).is_none());

    let task = model.update(Message::Compiled {
        token: job.token,
        result: Ok(CompileResult {
            download_url: "/download_pdf/Compiled_Doc_1.pdf".into(),
        }),
    });
    assert_eq!(
        task,
        Task::Download("/download_pdf/Compiled_Doc_1.pdf".into())
    );
    assert_eq!(model.gallery().page_count(), 2);
    assert!(!model.is_busy(Operation::Compile));
}

#[test]
fn test_compile_snapshot_ignores_later_removal() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    capture_with(&mut model, Ok(page("p1.jpg", true)));

    let Task::Compile(job) = model.update(Message::Compile) else {
        panic!("expected a compile task");
    };
    model.update(Message::RemovePage("p1.jpg".into()));

    assert_eq!(job.filenames, vec!["p1.jpg"]);
    assert!(model.gallery().is_empty());
}

#[test]
fn test_compile_failure_produces_no_download() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    capture_with(&mut model, Ok(page("p1.jpg", true)));
    model.take_notices();

    let Task::Compile(job) = model.update(Message::Compile) else {
        panic!("expected a compile task");
    };
    let task = model.update(Message::Compiled {
        token: job.token,
        result: Err(RemoteError::Compile("missing file".into())),
    });

    assert!(task.is_none());
    assert_eq!(model.take_notices()[0].message, "Compilation error");
}

#[test]
fn test_compile_empty_gallery_warns() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    model.take_notices();

    assert!(model.update(Message::Compile).is_none());
    assert!(!model.controls().compile_enabled);
    let notices = model.take_notices();
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(notices[0].message, "No pages to compile");
}

#[test]
fn test_removing_last_page_empties_gallery() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    capture_with(&mut model, Ok(page("only.jpg", true)));
    assert!(model.controls().compile_enabled);

    model.update(Message::RemovePage("only.jpg".into()));
    model.update(Message::RemovePage("only.jpg".into()));

    let controls = model.controls();
    assert!(controls.empty);
    assert_eq!(controls.page_count, 0);
    assert!(!controls.compile_enabled);
}

#[test]
fn test_black_preview_warns_once() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);
    model.take_notices();

    for _ in 0..100 {
        model.update(Message::PreviewFrame { mean_luma: 0.0 });
    }
    assert_eq!(model.take_notices().len(), 1);

    model.update(Message::PreviewFrame { mean_luma: 120.0 });
    for _ in 0..31 {
        model.update(Message::PreviewFrame { mean_luma: 2.0 });
    }
    assert_eq!(model.take_notices().len(), 1);
}

#[test]
fn test_single_page_scan_compile_remove() {
    let mut model = still_session(&["A"]);
    model.update(Message::Init);

    capture_with(
        &mut model,
        Ok(ProcessOutcome {
            record: PageRecord {
                filename: "p1.jpg".into(),
                url: "/scans/p1.jpg".into(),
                detected: true,
            },
            low_confidence: false,
        }),
    );
    assert_eq!(model.gallery().filenames(), vec!["p1.jpg"]);
    assert!(model.controls().compile_enabled);

    let Task::Compile(job) = model.update(Message::Compile) else {
        panic!("expected a compile task");
    };
    assert_eq!(job.filenames, vec!["p1.jpg"]);
    let task = model.update(Message::Compiled {
        token: job.token,
        result: Ok(CompileResult {
            download_url: "/downloads/out.pdf".into(),
        }),
    });
    assert_eq!(task, Task::Download("/downloads/out.pdf".into()));
    assert_eq!(model.gallery().filenames(), vec!["p1.jpg"]);

    model.update(Message::RemovePage("p1.jpg".into()));
    assert!(model.gallery().is_empty());
    assert!(!model.controls().compile_enabled);
}
