// SPDX-License-Identifier: GPL-3.0-only

//! Scan filter selection
//!
//! The filter is applied by the processing service, not locally. The client
//! only chooses which one to request with each captured frame.

use serde::{Deserialize, Serialize};

/// Filter requested from the processing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Thresholded black and white document
    #[default]
    Bw,
    /// Grayscale document
    Gray,
    /// Perspective-corrected color image
    Original,
}

impl FilterMode {
    /// All filters in cycling order
    pub const ALL: [FilterMode; 3] = [FilterMode::Bw, FilterMode::Gray, FilterMode::Original];

    /// Wire value sent to the processing service
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Bw => "bw",
            FilterMode::Gray => "gray",
            FilterMode::Original => "original",
        }
    }

    /// Next filter, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Parse a wire value
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::Bw => write!(f, "Black & White"),
            FilterMode::Gray => write!(f, "Grayscale"),
            FilterMode::Original => write!(f, "Color (Original)"),
        }
    }
}
