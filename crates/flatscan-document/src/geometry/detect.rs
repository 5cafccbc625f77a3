// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection: edge map, gap closing, largest contour, and
// reduction of that contour to four ordered corners.

use flatscan_core::config::EdgeConfig;
use image::RgbImage;
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{arc_length, contour_area, min_area_rect};
use imageproc::morphology::{dilate, erode};
use imageproc::point::Point;
use tracing::{debug, info, instrument, warn};

use super::polygon::approximate_polygon;
use super::quad::{BoundingBox, Point2D, Quad};

/// Where the four corners of a boundary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornerSource {
    /// The simplified contour had exactly four vertices.
    Polygon,
    /// Any other vertex count; the minimum-area rectangle was used instead.
    MinAreaRect,
}

/// The detected document outline in one image.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBoundary {
    pub quad: Quad,
    /// Axis-aligned extent of the selected contour, used when the
    /// perspective warp is rejected.
    pub bounds: BoundingBox,
    pub corner_source: CornerSource,
    /// Enclosed area of the selected contour in square pixels.
    pub area: f64,
}

/// Finds the most likely document outline in a segmented photo.
pub struct BoundaryDetector {
    config: EdgeConfig,
}

impl BoundaryDetector {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    /// Corners of the document, or `None` when the image has no contour.
    pub fn extract_quad(&self, image: &RgbImage) -> Option<Quad> {
        self.detect(image).map(|boundary| boundary.quad)
    }

    /// Locate the document boundary.
    ///
    /// ## Pipeline
    ///
    /// 1. Grayscale + Gaussian blur
    /// 2. Canny edge detection
    /// 3. Dilate then erode to close small gaps in the outline
    /// 4. Pick the contour enclosing the largest area
    /// 5. Douglas-Peucker at a tolerance proportional to the perimeter; four
    ///    vertices are used directly, anything else falls back to the
    ///    minimum-area rectangle
    /// 6. Assign corner roles
    ///
    /// Returns `None` when no contour encloses any area.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &RgbImage) -> Option<DocumentBoundary> {
        let Some((points, area)) = self.largest_contour(image) else {
            warn!("No document contour found");
            return None;
        };
        let bounds = BoundingBox::enclosing(&points)?;

        let epsilon = self.config.approx_epsilon_ratio * arc_length(&points, true);
        let approx = approximate_polygon(&points, epsilon);
        let (corners, corner_source) = match <[Point<i32>; 4]>::try_from(approx.as_slice()) {
            Ok(corners) => (corners, CornerSource::Polygon),
            Err(_) => {
                debug!(
                    vertices = approx.len(),
                    "Contour is not a quadrilateral; using minimum-area rectangle"
                );
                (min_area_rect(&points), CornerSource::MinAreaRect)
            }
        };

        let quad = Quad::from_corners(corners.map(|p| Point2D::new(p.x as f32, p.y as f32)));
        info!(
            area,
            ?corner_source,
            top_left = ?quad.top_left,
            bottom_right = ?quad.bottom_right,
            "Document boundary detected"
        );

        Some(DocumentBoundary {
            quad,
            bounds,
            corner_source,
            area,
        })
    }

    /// Edge map, gap closing and contour tracing; returns the contour with the
    /// largest enclosed area together with that area.
    fn largest_contour(&self, image: &RgbImage) -> Option<(Vec<Point<i32>>, f64)> {
        let gray = image::imageops::grayscale(image);
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        debug!(
            low = self.config.canny_low,
            high = self.config.canny_high,
            "Canny edge detection complete"
        );

        let closed = self.close_gaps(edges);
        let contours = find_contours::<i32>(&closed);
        debug!(contour_count = contours.len(), "Contours extracted");

        // Strictly-greater comparison: the first of several equal-area
        // contours wins, and zero-area contours are never selected.
        let mut best: Option<(Vec<Point<i32>>, f64)> = None;
        for contour in contours {
            let area = contour_area(&contour.points).abs();
            if area > best.as_ref().map_or(0.0, |(_, a)| *a) {
                best = Some((contour.points, area));
            }
        }
        best
    }

    /// Thicken edges, then thin them back by fewer passes.
    fn close_gaps(&self, edges: image::GrayImage) -> image::GrayImage {
        let mut map = edges;
        if self.config.dilate_iterations > 0 {
            map = dilate(&map, Norm::LInf, self.config.dilate_iterations);
        }
        if self.config.erode_iterations > 0 {
            map = erode(&map, Norm::LInf, self.config.erode_iterations);
        }
        map
    }
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self::new(EdgeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::geometry::approximate_polygon_dp;
    use imageproc::rect::Rect;

    fn photo_with_rect(w: u32, h: u32, x: i32, y: i32, rw: u32, rh: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(w, h, Rgb([25, 25, 25]));
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(rw, rh), Rgb([235, 235, 230]));
        img
    }

    #[test]
    fn blank_image_has_no_boundary() {
        let img = RgbImage::from_pixel(200, 150, Rgb([180, 180, 180]));
        assert!(BoundaryDetector::default().detect(&img).is_none());
    }

    #[test]
    fn axis_aligned_sheet_is_found() {
        let img = photo_with_rect(400, 300, 50, 40, 300, 220);
        let boundary = BoundaryDetector::default().detect(&img).expect("boundary");
        let quad = boundary.quad;

        // Corners land within a few pixels of the sheet (edges are thickened).
        let near = |p: Point2D, x: f32, y: f32| (p.x - x).abs() <= 6.0 && (p.y - y).abs() <= 6.0;
        assert!(near(quad.top_left, 50.0, 40.0), "{:?}", quad.top_left);
        assert!(near(quad.top_right, 349.0, 40.0), "{:?}", quad.top_right);
        assert!(near(quad.bottom_right, 349.0, 259.0), "{:?}", quad.bottom_right);
        assert!(near(quad.bottom_left, 50.0, 259.0), "{:?}", quad.bottom_left);

        assert!(boundary.bounds.width >= 300 && boundary.bounds.width <= 312);
        assert!(boundary.bounds.height >= 220 && boundary.bounds.height <= 232);
    }

    const SHEET: [(i32, i32); 4] = [(80, 60), (420, 90), (400, 350), (60, 320)];

    fn skewed_sheet_photo() -> RgbImage {
        let mut img = RgbImage::from_pixel(500, 400, Rgb([20, 20, 20]));
        let sheet = SHEET.map(|(x, y)| Point::new(x, y));
        draw_polygon_mut(&mut img, &sheet, Rgb([240, 240, 240]));
        img
    }

    /// Largest distance from a drawn sheet corner to its nearest vertex.
    fn worst_corner_error(vertices: &[Point<i32>]) -> f64 {
        SHEET
            .iter()
            .map(|&(cx, cy)| {
                vertices
                    .iter()
                    .map(|p| ((p.x - cx) as f64).hypot((p.y - cy) as f64))
                    .fold(f64::INFINITY, f64::min)
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn skewed_sheet_corner_order() {
        let quad = BoundaryDetector::default().extract_quad(&skewed_sheet_photo()).expect("quad");
        let corners = quad.corners();
        let sum = |p: &Point2D| p.x + p.y;
        let tl = sum(&quad.top_left);
        let br = sum(&quad.bottom_right);
        assert!(corners.iter().all(|c| tl <= sum(c)));
        assert!(corners.iter().all(|c| br >= sum(c)));
        assert!(quad.top_right.x > quad.top_left.x);
        assert!(quad.bottom_left.y > quad.top_left.y);
    }

    #[test]
    fn skewed_sheet_corners_are_accurate() {
        let quad = BoundaryDetector::default().extract_quad(&skewed_sheet_photo()).expect("quad");
        let [tl, tr, br, bl] = SHEET;
        let near = |p: Point2D, (x, y): (i32, i32)| {
            (p.x - x as f32).abs() <= 6.0 && (p.y - y as f32).abs() <= 6.0
        };
        assert!(near(quad.top_left, tl), "{:?}", quad.top_left);
        assert!(near(quad.top_right, tr), "{:?}", quad.top_right);
        assert!(near(quad.bottom_right, br), "{:?}", quad.bottom_right);
        assert!(near(quad.bottom_left, bl), "{:?}", quad.bottom_left);
    }

    #[test]
    fn split_at_extremes_beats_first_pixel_anchored_simplifier() {
        let detector = BoundaryDetector::default();
        let (points, _) = detector.largest_contour(&skewed_sheet_photo()).expect("contour");
        let epsilon = EdgeConfig::default().approx_epsilon_ratio * arc_length(&points, true);

        let ours = approximate_polygon(&points, epsilon);
        let anchored = approximate_polygon_dp(&points, epsilon, true);
        assert_eq!(ours.len(), 4, "got {ours:?}");
        assert!(worst_corner_error(&ours) <= 6.0, "got {ours:?}");
        assert!(
            worst_corner_error(&anchored) > worst_corner_error(&ours),
            "anchored {anchored:?} vs ours {ours:?}"
        );
    }

    #[test]
    fn min_area_rect_fallback_encloses_a_round_blob() {
        let mut img = RgbImage::from_pixel(300, 300, Rgb([20, 20, 20]));
        draw_filled_circle_mut(&mut img, (150, 150), 90, Rgb([240, 240, 240]));
        let boundary = BoundaryDetector::default().detect(&img).expect("boundary");
        assert_eq!(boundary.corner_source, CornerSource::MinAreaRect);
        // Any rotation of the enclosing square puts its corners about r * sqrt(2) out.
        for corner in boundary.quad.corners() {
            let reach = corner.distance(&Point2D::new(150.0, 150.0));
            assert!((115.0..=145.0).contains(&reach), "{corner:?}");
        }
    }

    #[test]
    fn largest_of_two_sheets_wins() {
        let mut img = photo_with_rect(600, 400, 20, 20, 150, 100);
        draw_filled_rect_mut(&mut img, Rect::at(250, 80).of_size(300, 280), Rgb([235, 235, 230]));

        let boundary = BoundaryDetector::default().detect(&img).expect("boundary");
        assert!(boundary.bounds.x >= 240, "picked {:?}", boundary.bounds);
        assert!(boundary.area > 150.0 * 100.0);
    }
}
