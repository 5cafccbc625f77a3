// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatscan-document: Photo-to-document processing for Flatscan.
//
// Locates the sheet of paper in a photograph, warps it flat, cleans it up
// (margin trim, local contrast, sharpening), brings a batch of pages onto one
// canvas size and assembles them into a multi-page PDF.

pub mod geometry;
pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `flatscan_document::ScanPipeline` etc.
pub use geometry::{BoundaryDetector, DocumentBoundary, Quad};
pub use crate::image::processor::ImageProcessor;
pub use pdf::writer::PdfWriter;
pub use scan::{
    BatchNormalizer, Page, PageRefiner, PassthroughSegmenter, Rectifier, ScanOutput,
    ScanPipeline, Segmenter, SourceImage,
};

#[cfg(feature = "segment-model")]
pub use scan::ModelSegmenter;
