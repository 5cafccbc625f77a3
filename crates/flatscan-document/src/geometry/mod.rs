// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry module: document boundary detection and the contour simplifier it
// relies on.

pub mod detect;
pub mod polygon;
pub mod quad;

pub use detect::{BoundaryDetector, CornerSource, DocumentBoundary};
pub use quad::{BoundingBox, Point2D, Quad};
