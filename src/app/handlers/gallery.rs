// SPDX-License-Identifier: GPL-3.0-only

//! Gallery handlers
//!
//! Page removal, compilation and the download that follows it.

use crate::app::SessionModel;
use crate::app::state::{CompileJob, NoticeLevel, Operation, RequestToken, Task};
use crate::config::CompileOrder;
use crate::errors::{AppError, RemoteError};
use crate::remote::{CompileResult, DownloadOutcome};
use tracing::{debug, info, warn};

impl SessionModel {
    // =========================================================================
    // Gallery Handlers
    // =========================================================================

    pub(crate) fn handle_remove_page(&mut self, filename: &str) -> Task {
        match self.gallery.remove(filename) {
            Some(_) => info!(filename, pages = self.gallery.page_count(), "Page removed"),
            None => debug!(filename, "Remove ignored, page not in gallery"),
        }
        Task::none()
    }

    /// Request compilation of the current pages
    ///
    /// The page list is a snapshot; later gallery edits do not affect the
    /// request. Ignored while a compile is outstanding.
    pub(crate) fn handle_compile(&mut self) -> Task {
        if !self.gallery.can_compile() {
            self.notify(NoticeLevel::Warning, "No pages to compile");
            return Task::none();
        }

        let token = match self.in_flight.begin(Operation::Compile) {
            Ok(token) => token,
            Err(err) => {
                debug!(error = %err, "Compile ignored");
                return Task::none();
            }
        };

        let filenames = match self.compile_order {
            CompileOrder::Gallery => self.gallery.filenames(),
            CompileOrder::Capture => self.gallery.capture_order(),
        };
        info!(%token, pages = filenames.len(), order = ?self.compile_order, "Compiling document");
        Task::Compile(CompileJob { token, filenames })
    }

    pub(crate) fn handle_compiled(
        &mut self,
        token: RequestToken,
        result: Result<CompileResult, RemoteError>,
    ) -> Task {
        if !self.in_flight.finish(Operation::Compile, token) {
            warn!(%token, "Ignoring stale compile result");
            return Task::none();
        }

        match result {
            Ok(result) => {
                info!(url = %result.download_url, "Document compiled");
                Task::Download(result.download_url)
            }
            Err(err) => {
                self.report(AppError::Remote(err));
                Task::none()
            }
        }
    }

    pub(crate) fn handle_downloaded(
        &mut self,
        result: Result<DownloadOutcome, RemoteError>,
    ) -> Task {
        match result {
            Ok(outcome) => {
                info!(%outcome, "Document delivered");
                self.notify(NoticeLevel::Success, "PDF Downloaded!");
            }
            Err(err) => self.report(AppError::Remote(err)),
        }
        Task::none()
    }
}
