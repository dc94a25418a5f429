// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG data URI   │
//! │ (RGB/Gray)   │     │  - Grab           │     │  + filter mode   │
//! │              │     │  - JPEG encoding  │     │                  │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//! ```
//!
//! - [`photo`]: frame snapshot and JPEG encoding

pub mod photo;
