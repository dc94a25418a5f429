// SPDX-License-Identifier: MPL-2.0

//! Scan Camera - capture client for a remote document-scanning service
//!
//! This library drives a capture session: it picks a camera, keeps one live
//! stream, sends captured frames to the processing service, collects the
//! returned pages and asks the service to compile them into a PDF.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: the session state machine (messages, tasks, gallery)
//! - [`backends`]: camera backend abstraction (V4L2, still images)
//! - [`pipelines`]: frame snapshot and JPEG encoding
//! - [`remote`]: HTTP clients for the processing service
//! - [`config`]: user configuration handling
//! - [`terminal`]: interactive terminal front-end
//!
//! # Example
//!
//! ```ignore
//! use scan_camera::app::{Executor, Message, SessionModel, SessionRuntime, SessionSettings};
//! use scan_camera::backends::camera::get_backend_for_type;
//!
//! let config = scan_camera::Config::default();
//! let backend = get_backend_for_type(config.backend, &config.still_images)?;
//! let model = SessionModel::new(backend, SessionSettings::from_config(&config)?);
//! let rt = tokio::runtime::Runtime::new()?;
//! let mut session = SessionRuntime::new(model, Executor::from_config(&config)?, rt.handle().clone());
//! session.dispatch(Message::Init);
//! session.dispatch(Message::Capture);
//! rt.block_on(session.settle());
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod remote;
pub mod terminal;

// Re-export commonly used types
pub use app::{Message, SessionModel, SessionSettings, Task};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use pipelines::photo::FilterMode;
