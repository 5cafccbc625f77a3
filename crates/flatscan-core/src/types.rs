// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Flatscan pipeline.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pixel dimensions shared by every page of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel area, widened so large photos cannot overflow.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for CanvasSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Unique file name for one assembled document.
///
/// Combines a unix timestamp with a short random suffix so concurrent batches
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentName(String);

impl DocumentName {
    pub fn generate(prefix: &str) -> Self {
        let timestamp = Utc::now().timestamp();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{prefix}_{timestamp}_{}.pdf", &suffix[..6]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without the `.pdf` extension.
    pub fn stem(&self) -> &str {
        self.0.strip_suffix(".pdf").unwrap_or(&self.0)
    }
}

impl std::fmt::Display for DocumentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The encoded multi-page document produced by one batch.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub file_name: DocumentName,
    pub page_count: usize,
}

/// How a page's geometry was corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rectification {
    /// The document quadrilateral was warped to a fronto-parallel rectangle.
    Perspective,
    /// The warp looked implausible; the contour's bounding box was cropped instead.
    BoundingBoxCrop,
    /// No document boundary was found; the segmented photo is used as-is.
    Unchanged,
}

/// Per-page record of what the pipeline did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    /// Name of the source image (informational only).
    pub source: String,
    pub rectification: Rectification,
    /// Page size after rectification and refinement, before normalization.
    pub refined_size: CanvasSize,
}

/// Summary of one processed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub canvas: CanvasSize,
    pub pages: Vec<PageReport>,
}
