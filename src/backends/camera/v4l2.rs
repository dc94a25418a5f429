// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Devices are the `/dev/video*` nodes that advertise video capture. Each
//! live stream runs a capture thread that dequeues memory-mapped buffers and
//! keeps only the most recent one. Stopping a stream joins that thread, so
//! the device node is closed by the time `stop()` returns.

use super::format_converters::{self, RawFormat};
use super::types::{
    BackendError, BackendResult, CameraBackendType, CameraFrame, DeviceKind, MediaDeviceInfo,
    StreamConstraints,
};
use super::{CameraBackend, LiveStream};
use crate::constants::streaming;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream as _;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Backend over Video4Linux2 device nodes
#[derive(Debug, Default)]
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_devices(&self) -> BackendResult<Vec<MediaDeviceInfo>> {
        let mut nodes = v4l::context::enum_devices();
        nodes.sort_by_key(|node| node_number(node.path()));

        let mut devices = Vec::new();
        let mut denied = 0usize;

        for node in nodes {
            let path = node.path().display().to_string();

            let dev = match Device::with_path(node.path()) {
                Ok(dev) => dev,
                Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                    warn!(device = %path, "Permission denied opening camera");
                    denied += 1;
                    continue;
                }
                Err(err) => {
                    debug!(device = %path, error = %err, "Skipping unreadable device");
                    continue;
                }
            };

            let caps = match dev.query_caps() {
                Ok(caps) => caps,
                Err(err) => {
                    debug!(device = %path, error = %err, "VIDIOC_QUERYCAP failed");
                    continue;
                }
            };

            let kind = if caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                DeviceKind::VideoInput
            } else {
                DeviceKind::Other("video".to_string())
            };

            debug!(device = %path, card = %caps.card, driver = %caps.driver, ?kind, "Found V4L2 node");
            devices.push(MediaDeviceInfo {
                device_id: path,
                kind,
                label: caps.card,
            });
        }

        if devices.is_empty() && denied > 0 {
            return Err(BackendError::PermissionDenied(format!(
                "{} camera device(s) not accessible",
                denied
            )));
        }

        Ok(devices)
    }

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> BackendResult<Box<dyn LiveStream>> {
        let device_id = constraints.device_id.as_str();
        info!(device = %device_id, "Opening V4L2 device");

        let dev =
            Device::with_path(device_id).map_err(|e| BackendError::from_io(device_id, &e))?;
        let (format, raw_format) = negotiate_format(&dev, constraints)?;

        info!(
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "V4L2 format configured"
        );

        let latest: Arc<Mutex<Option<RawBuffer>>> = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = {
            let latest = Arc::clone(&latest);
            let running = Arc::clone(&running);
            std::thread::Builder::new()
                .name("v4l2-capture".to_string())
                .spawn(move || capture_loop(dev, latest, running, ready_tx))
                .map_err(|e| BackendError::Other(format!("Failed to spawn capture thread: {}", e)))?
        };

        // Wait until buffers are queued so stream errors surface here
        let startup = ready_rx
            .recv()
            .unwrap_or_else(|_| Err("capture thread exited".to_string()));
        if let Err(msg) = startup {
            running.store(false, Ordering::SeqCst);
            let _ = thread.join();
            return Err(BackendError::AcquisitionFailed(msg));
        }

        Ok(Box::new(V4l2Stream {
            device_id: device_id.to_string(),
            width: format.width,
            height: format.height,
            stride: format.stride,
            raw_format,
            latest,
            running,
            thread: Some(thread),
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

/// Pick a decodable format as close as possible to the requested size
fn negotiate_format(
    dev: &Device,
    constraints: &StreamConstraints,
) -> BackendResult<(Format, RawFormat)> {
    for code in RawFormat::PREFERRED {
        let requested = Format::new(
            constraints.ideal_width,
            constraints.ideal_height,
            FourCC::new(code),
        );
        match dev.set_format(&requested) {
            Ok(actual) => {
                if let Some(raw) = RawFormat::from_fourcc(&actual.fourcc.repr) {
                    return Ok((actual, raw));
                }
            }
            Err(err) => {
                debug!(fourcc = %FourCC::new(code), error = %err, "Format rejected");
            }
        }
    }

    let current = dev
        .format()
        .map_err(|e| BackendError::from_io(&constraints.device_id, &e))?;
    match RawFormat::from_fourcc(&current.fourcc.repr) {
        Some(raw) => Ok((current, raw)),
        None => Err(BackendError::FormatNotSupported(format!(
            "{} uses {}",
            constraints.device_id, current.fourcc
        ))),
    }
}

/// Numeric suffix of a /dev/videoN path, for stable ordering
fn node_number(path: &Path) -> u32 {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.trim_start_matches("video").parse().ok())
        .unwrap_or(u32::MAX)
}

struct RawBuffer {
    data: Arc<[u8]>,
    captured_at: Instant,
}

/// Capture loop running in its own thread
///
/// Reports startup success or failure through `ready`, then keeps the most
/// recent buffer in `latest` until `running` is cleared.
fn capture_loop(
    dev: Device,
    latest: Arc<Mutex<Option<RawBuffer>>>,
    running: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), String>>,
) {
    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, streaming::BUFFER_COUNT)
    {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(format!("Failed to create buffer stream: {}", e)));
            return;
        }
    };
    stream.set_timeout(streaming::DEQUEUE_TIMEOUT);
    let _ = ready.send(Ok(()));

    info!("V4L2 capture loop started");

    while running.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, meta)) => {
                let used = meta.bytesused as usize;
                let bytes = if used > 0 && used <= buf.len() {
                    &buf[..used]
                } else {
                    buf
                };
                if let Ok(mut slot) = latest.lock() {
                    *slot = Some(RawBuffer {
                        data: Arc::from(bytes),
                        captured_at: Instant::now(),
                    });
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!(error = %e, "Failed to dequeue frame");
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        }
    }

    info!("V4L2 capture loop ended");
}

/// Live V4L2 stream
pub struct V4l2Stream {
    device_id: String,
    width: u32,
    height: u32,
    stride: u32,
    raw_format: RawFormat,
    latest: Arc<Mutex<Option<RawBuffer>>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LiveStream for V4l2Stream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn latest_frame(&self) -> Option<CameraFrame> {
        let (data, captured_at) = {
            let slot = self.latest.lock().ok()?;
            let raw = slot.as_ref()?;
            (Arc::clone(&raw.data), raw.captured_at)
        };

        match format_converters::decode(
            self.raw_format,
            &data,
            self.width,
            self.height,
            self.stride,
        ) {
            Ok(mut frame) => {
                frame.captured_at = captured_at;
                Some(frame)
            }
            Err(err) => {
                debug!(error = %err, "Dropping undecodable frame");
                None
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(device = %self.device_id, "Capture thread panicked");
            }
            info!(device = %self.device_id, "V4L2 device released");
        }
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
    }

    fn is_active(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        self.stop();
    }
}
