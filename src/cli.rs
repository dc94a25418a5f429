// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanning without the terminal UI
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Probing cameras for usable frames
//! - Capturing a batch of pages and compiling them
//! - Asking the server to clean up

use scan_camera::app::{Message, Notice, NoticeLevel, SessionRuntime};
use scan_camera::backends::camera::{
    CaptureStream, DeviceRegistry, get_backend_for_type,
};
use scan_camera::config::Config;
use scan_camera::constants::{black_frame, timing};
use scan_camera::pipelines::photo::FilterMode;
use scan_camera::remote::ServerClient;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = get_backend_for_type(config.backend, &config.still_images)?;
    let mut registry = DeviceRegistry::new();
    let devices = registry.enumerate(backend.as_ref())?;

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.backend_type());
    println!();
    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {}", index, device.label);
        println!("      {}", device.id);
    }

    Ok(())
}

/// Open every camera once and report whether it delivers a usable image
pub fn probe_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut backend = get_backend_for_type(config.backend, &config.still_images)?;
    let mut registry = DeviceRegistry::new();
    let devices = registry.enumerate(backend.as_ref())?.to_vec();

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let mut stream = CaptureStream::new(config.resolution());
    for (index, device) in devices.iter().enumerate() {
        print!("  [{}] {}: ", index, device.label);

        if let Err(e) = stream.start(backend.as_mut(), &device.id) {
            println!("FAILED ({})", e);
            continue;
        }

        // Let the sensor settle, then take the next frame
        let start = Instant::now();
        let mut frame = None;
        while start.elapsed() < timing::PROBE_TIMEOUT {
            if let Some(f) = stream.latest_frame() {
                frame = Some(f);
                if start.elapsed() > timing::PROBE_WARMUP {
                    break;
                }
            }
            std::thread::sleep(Duration::from_millis(16));
        }

        match frame {
            None => println!("NO FRAME"),
            Some(f) => {
                let mean = f.mean_luma();
                if mean < black_frame::PROBE_MEAN_THRESHOLD {
                    println!("BLACK FRAME ({}x{}, mean {:.1})", f.width, f.height, mean);
                } else {
                    println!("WORKING ({}x{}, mean {:.1})", f.width, f.height, mean);
                }
            }
        }
        stream.stop();
    }

    Ok(())
}

/// Capture `pages` pages `interval` seconds apart, then compile them
pub fn batch_scan(
    config: &Config,
    pages: usize,
    interval: u64,
    camera: Option<usize>,
    filter: Option<FilterMode>,
) -> Result<(), Box<dyn std::error::Error>> {
    if pages == 0 {
        return Err("Page count must be at least 1".into());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let mut session = SessionRuntime::from_config(config, rt.handle().clone())?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    session.dispatch(Message::Init);
    print_notices(&mut session);

    if let Some(index) = camera {
        let devices = session.model().devices();
        let Some(device) = devices.get(index) else {
            return Err(format!(
                "Camera index {} out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            )
            .into());
        };
        session.dispatch(Message::SelectDevice(device.id.clone()));
        print_notices(&mut session);
    }
    if let Some(filter) = filter {
        session.dispatch(Message::SetFilter(filter));
    }

    let device = session
        .model()
        .active_device()
        .cloned()
        .ok_or("No camera could be started")?;
    println!("Using camera: {}", device.label);
    println!("Filter: {}", session.model().filter());

    wait_for_first_frame(&session)?;

    for page in 1..=pages {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        println!("Capturing page {}/{}...", page, pages);
        session.dispatch(Message::Capture);
        rt.block_on(session.settle());
        print_notices(&mut session);

        if page < pages {
            sleep_unless_stopped(Duration::from_secs(interval), &stop_flag);
        }
    }

    session.dispatch(Message::StopCamera);

    if !session.model().controls().compile_enabled {
        println!("No pages captured, nothing to compile.");
        return Ok(());
    }

    println!(
        "Compiling {} page(s)...",
        session.model().gallery().page_count()
    );
    session.dispatch(Message::Compile);
    rt.block_on(session.settle());
    print_notices(&mut session);

    Ok(())
}

/// Ask the server to clean up its scratch files
pub fn cleanup(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = ServerClient::new(&config.server_url, config.request_timeout())?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server.cleanup())?;
    println!("Server cleanup done.");
    Ok(())
}

fn wait_for_first_frame(session: &SessionRuntime) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    while start.elapsed() < timing::PROBE_TIMEOUT {
        if session.model().latest_frame().is_some() {
            // Give auto exposure a moment after the first frame
            std::thread::sleep(timing::PROBE_WARMUP);
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(16));
    }
    Err("Camera did not deliver a frame".into())
}

fn sleep_unless_stopped(duration: Duration, stop_flag: &AtomicBool) {
    let start = Instant::now();
    while start.elapsed() < duration && !stop_flag.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
}

fn print_notices(session: &mut SessionRuntime) {
    for Notice { level, message, .. } in session.model_mut().take_notices() {
        match level {
            NoticeLevel::Error => eprintln!("  error: {}", message),
            NoticeLevel::Warning => println!("  warning: {}", message),
            NoticeLevel::Info | NoticeLevel::Success => println!("  {}", message),
        }
    }
}
