// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification: warp the document quadrilateral to an upright
// rectangle, or fall back to a bounding-box crop when the warp is implausible.

use flatscan_core::Rectification;
use flatscan_core::config::RectifyConfig;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument, warn};

use crate::geometry::{DocumentBoundary, Quad};
use crate::image::processor::ImageProcessor;

/// Corrects perspective distortion using a detected document boundary.
pub struct Rectifier {
    config: RectifyConfig,
}

impl Rectifier {
    pub fn new(config: RectifyConfig) -> Self {
        Self { config }
    }

    /// Rectify `image` using `boundary`.
    ///
    /// The output is `quad.target_width()` x `quad.target_height()` unless that
    /// size exceeds the source frame by more than `max_inflation` on either
    /// axis, or the corners admit no projective transform. In those cases the
    /// image is cropped to the contour's bounding box instead.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn rectify(&self, image: RgbImage, boundary: &DocumentBoundary) -> (RgbImage, Rectification) {
        let quad = &boundary.quad;
        let out_w = quad.target_width();
        let out_h = quad.target_height();

        let w_ratio = out_w as f64 / image.width() as f64;
        let h_ratio = out_h as f64 / image.height() as f64;
        debug!(out_w, out_h, w_ratio, h_ratio, "Destination rectangle computed");

        if w_ratio > self.config.max_inflation || h_ratio > self.config.max_inflation {
            warn!(
                w_ratio,
                h_ratio,
                max = self.config.max_inflation,
                "Rectified page would outgrow the photo; cropping to contour bounds"
            );
            return (crop_to_bounds(image, boundary), Rectification::BoundingBoxCrop);
        }

        match warp_quad(&image, quad, out_w, out_h) {
            Some(warped) => {
                info!(out_w, out_h, "Perspective correction applied");
                (warped, Rectification::Perspective)
            }
            None => {
                warn!("Corners admit no projective transform; cropping to contour bounds");
                (crop_to_bounds(image, boundary), Rectification::BoundingBoxCrop)
            }
        }
    }
}

impl Default for Rectifier {
    fn default() -> Self {
        Self::new(RectifyConfig::default())
    }
}

/// Map the quad onto `(0,0)..(w-1,h-1)` and resample with bilinear
/// interpolation. Samples falling outside the source are black.
fn warp_quad(image: &RgbImage, quad: &Quad, out_w: u32, out_h: u32) -> Option<RgbImage> {
    let right = (out_w - 1) as f32;
    let bottom = (out_h - 1) as f32;
    let dest: [(f32, f32); 4] = [
        (0.0, 0.0),      // top-left
        (right, 0.0),    // top-right
        (right, bottom), // bottom-right
        (0.0, bottom),   // bottom-left
    ];
    let src = quad.corners().map(|p| p.as_tuple());

    let projection = Projection::from_control_points(src, dest)?;
    let mut output = RgbImage::new(out_w, out_h);
    warp_into(image, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut output);
    Some(output)
}

fn crop_to_bounds(image: RgbImage, boundary: &DocumentBoundary) -> RgbImage {
    let b = boundary.bounds;
    ImageProcessor::from_rgb(image)
        .crop(b.x, b.y, b.width, b.height)
        .into_rgb()
}
