// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Points, quadrilaterals and bounding boxes in image coordinates.

use imageproc::point::Point;

/// A real-valued image coordinate (x grows right, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    pub fn as_tuple(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// Four document corners tagged by role.
///
/// Built with [`Quad::from_corners`], which assigns roles with the
/// sum/difference rule. That rule is reliable for near-axis-aligned documents;
/// at extreme skew it can assign two roles to the same point, and no
/// convexity check is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub top_left: Point2D,
    pub top_right: Point2D,
    pub bottom_right: Point2D,
    pub bottom_left: Point2D,
}

impl Quad {
    /// Assign corner roles to four unordered points.
    ///
    /// - top-left: smallest `x + y`
    /// - bottom-right: largest `x + y`
    /// - top-right: smallest `y - x`
    /// - bottom-left: largest `y - x`
    ///
    /// Ties go to the earliest point.
    pub fn from_corners(points: [Point2D; 4]) -> Self {
        let sum = |p: &Point2D| p.x + p.y;
        let diff = |p: &Point2D| p.y - p.x;

        Self {
            top_left: points[arg_extreme(&points, sum, |a, b| a < b)],
            top_right: points[arg_extreme(&points, diff, |a, b| a < b)],
            bottom_right: points[arg_extreme(&points, sum, |a, b| a > b)],
            bottom_left: points[arg_extreme(&points, diff, |a, b| a > b)],
        }
    }

    /// Corners in `[top_left, top_right, bottom_right, bottom_left]` order.
    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Width of the rectified page: the longer of the top and bottom edges,
    /// truncated to whole pixels and never below 1.
    pub fn target_width(&self) -> u32 {
        let bottom = self.bottom_right.distance(&self.bottom_left);
        let top = self.top_right.distance(&self.top_left);
        (bottom as u32).max(top as u32).max(1)
    }

    /// Height of the rectified page: the longer of the right and left edges.
    pub fn target_height(&self) -> u32 {
        let right = self.top_right.distance(&self.bottom_right);
        let left = self.top_left.distance(&self.bottom_left);
        (right as u32).max(left as u32).max(1)
    }
}

/// Index of the point whose `key` wins under `better`, first point on ties.
fn arg_extreme(
    points: &[Point2D; 4],
    key: impl Fn(&Point2D) -> f32,
    better: impl Fn(f32, f32) -> bool,
) -> usize {
    let mut best = 0;
    for i in 1..points.len() {
        if better(key(&points[i]), key(&points[best])) {
            best = i;
        }
    }
    best
}

/// Axis-aligned integer rectangle, inclusive of every pixel it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box covering every contour pixel, clipped at the image origin.
    ///
    /// Returns `None` for an empty point set.
    pub fn enclosing(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let x = min_x.max(0) as u32;
        let y = min_y.max(0) as u32;
        let right = max_x.max(0) as u32;
        let bottom = max_y.max(0) as u32;
        Some(Self {
            x,
            y,
            width: right - x + 1,
            height: bottom - y + 1,
        })
    }
}
