// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The main `update()` function acts as a dispatcher; the handlers live in
//! the `handlers` submodules organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::camera`: enumeration, selection, flip, black-frame monitor
//! - `handlers::capture`: filter selection, capture, processing results
//! - `handlers::gallery`: page removal, compilation, download results

use crate::app::SessionModel;
use crate::app::state::{Message, Task};
use tracing::debug;

impl SessionModel {
    /// Apply one message and return the I/O it requires
    pub fn update(&mut self, message: Message) -> Task {
        match message {
            // ===== Camera =====
            Message::Init => self.handle_init(),
            Message::RefreshDevices => self.handle_refresh_devices(),
            Message::SelectDevice(id) => self.handle_select_device(id),
            Message::FlipCamera => self.handle_flip_camera(),
            Message::StopCamera => self.handle_stop_camera(),
            Message::PreviewFrame { mean_luma } => self.handle_preview_frame(mean_luma),

            // ===== Capture =====
            Message::SetFilter(filter) => self.handle_set_filter(filter),
            Message::CycleFilter => self.handle_set_filter(self.filter.next()),
            Message::Capture => self.handle_capture(),
            Message::Processed { token, result } => self.handle_processed(token, result),
            Message::ClearCaptureFlash => {
                debug!("Capture flash cleared");
                self.capture_flash = None;
                Task::none()
            }

            // ===== Gallery =====
            Message::RemovePage(filename) => self.handle_remove_page(&filename),
            Message::Compile => self.handle_compile(),
            Message::Compiled { token, result } => self.handle_compiled(token, result),
            Message::Downloaded(result) => self.handle_downloaded(result),
        }
    }
}
