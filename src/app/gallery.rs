// SPDX-License-Identifier: GPL-3.0-only

//! Session gallery
//!
//! Pages accepted by the processing service, most recent first. The gallery
//! lives only as long as the session.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// A processed page as stored by the server
///
/// `filename` is the identity used for removal and compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub filename: String,
    pub url: String,
    /// Whether the server found a document outline
    pub detected: bool,
}

/// Ordered page collection
#[derive(Debug, Clone, Default)]
pub struct GallerySession {
    pages: VecDeque<PageRecord>,
}

impl GallerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a page at the front
    ///
    /// Duplicate filenames are not reconciled.
    pub fn add(&mut self, record: PageRecord) {
        debug!(filename = %record.filename, "Page added");
        self.pages.push_front(record);
    }

    /// Remove the first page with `filename`
    pub fn remove(&mut self, filename: &str) -> Option<PageRecord> {
        let idx = self.pages.iter().position(|p| p.filename == filename)?;
        let removed = self.pages.remove(idx);
        debug!(filename, remaining = self.pages.len(), "Page removed");
        removed
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Compilation needs at least one page
    pub fn can_compile(&self) -> bool {
        !self.pages.is_empty()
    }

    /// Filenames in gallery order (most recent first)
    pub fn filenames(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.filename.clone()).collect()
    }

    /// Filenames in capture order (oldest first)
    pub fn capture_order(&self) -> Vec<String> {
        self.pages.iter().rev().map(|p| p.filename.clone()).collect()
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PageRecord> {
        self.pages.get(index)
    }
}
