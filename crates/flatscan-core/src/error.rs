// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flatscan.

use thiserror::Error;

/// Top-level error type for all Flatscan operations.
///
/// A missing document boundary or an implausible perspective warp are not
/// errors; the pipeline degrades gracefully and records them per page.
#[derive(Debug, Error)]
pub enum FlatscanError {
    // -- Input errors --
    #[error("no images were submitted")]
    EmptyInput,

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Pipeline errors --
    #[error("background segmentation failed: {0}")]
    Segmentation(String),

    #[error("document encoding failed: {0}")]
    EncodingFailure(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
