// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: segmentation, perspective rectification, page
// refinement, batch normalization and orchestration.

pub mod clahe;
pub mod enhance;
pub mod normalize;
pub mod page;
pub mod pipeline;
pub mod rectify;
pub mod segment;

pub use enhance::PageRefiner;
pub use normalize::BatchNormalizer;
pub use page::Page;
pub use pipeline::{ScanOutput, ScanPipeline, SourceImage};
pub use rectify::Rectifier;
pub use segment::{PassthroughSegmenter, Segmenter};

#[cfg(feature = "segment-model")]
pub use segment::ModelSegmenter;
