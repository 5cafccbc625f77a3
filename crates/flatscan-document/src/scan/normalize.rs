// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch normalization: bring every page of a batch onto one shared canvas
// sized after the median-area page.

use flatscan_core::CanvasSize;
use flatscan_core::error::FlatscanError;
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::scan::page::Page;

/// Places every page of a batch on a canvas of one common size.
pub struct BatchNormalizer {
    background: [u8; 3],
}

impl BatchNormalizer {
    pub fn new(background: [u8; 3]) -> Self {
        Self { background }
    }

    /// Pick the shared canvas: sort page indices by area (stable, so equal
    /// areas keep input order) and take the one at `len / 2`.
    pub fn canvas_for(pages: &[Page]) -> Result<CanvasSize, FlatscanError> {
        if pages.is_empty() {
            return Err(FlatscanError::EmptyInput);
        }
        let mut order: Vec<usize> = (0..pages.len()).collect();
        order.sort_by_key(|&i| pages[i].area());
        let median = order[pages.len() / 2];
        debug!(median, "Median-area page selected");
        Ok(pages[median].size())
    }

    /// Downscale each page to fit the canvas (never upscaling) and centre it
    /// on a fresh background-filled canvas. Page order is preserved.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn normalize(&self, pages: Vec<Page>) -> Result<(Vec<Page>, CanvasSize), FlatscanError> {
        let canvas = Self::canvas_for(&pages)?;

        let normalized = pages
            .into_iter()
            .map(|page| {
                let image = ImageProcessor::from_rgb(page.into_image())
                    .fit_within(canvas.width, canvas.height)
                    .place_on_canvas(canvas.width, canvas.height, self.background)
                    .into_rgb();
                Page::new(image)
            })
            .collect::<Vec<_>>();

        info!(%canvas, pages = normalized.len(), "Batch normalized");
        Ok((normalized, canvas))
    }
}

impl Default for BatchNormalizer {
    fn default() -> Self {
        Self::new([255, 255, 255])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn square(side: u32) -> Page {
        Page::new(RgbImage::from_pixel(side, side, Rgb([0, 0, 0])))
    }

    #[test]
    fn median_area_page_sets_the_canvas() {
        let pages: Vec<Page> = [10, 20, 30, 40, 50].into_iter().map(square).collect();
        let (out, canvas) = BatchNormalizer::default().normalize(pages).unwrap();
        assert_eq!(canvas, CanvasSize::new(30, 30));
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|p| p.size() == canvas));
    }

    #[test]
    fn input_order_does_not_change_the_median() {
        let pages: Vec<Page> = [50, 10, 40, 30, 20].into_iter().map(square).collect();
        assert_eq!(BatchNormalizer::canvas_for(&pages).unwrap(), CanvasSize::new(30, 30));
    }

    #[test]
    fn even_batches_take_the_upper_middle_index() {
        let pages: Vec<Page> = [10, 20, 30, 40].into_iter().map(square).collect();
        assert_eq!(BatchNormalizer::canvas_for(&pages).unwrap(), CanvasSize::new(30, 30));
    }

    #[test]
    fn small_pages_are_centred_not_upscaled() {
        let pages = vec![square(10), square(30), square(50)];
        let (out, _) = BatchNormalizer::default().normalize(pages).unwrap();
        let small = out[0].image();
        assert_eq!(small.get_pixel(9, 9), &Rgb([255, 255, 255]));
        assert_eq!(small.get_pixel(10, 10), &Rgb([0, 0, 0]));
        assert_eq!(small.get_pixel(19, 19), &Rgb([0, 0, 0]));
        assert_eq!(small.get_pixel(20, 20), &Rgb([255, 255, 255]));
    }

    #[test]
    fn wide_pages_keep_their_aspect_ratio() {
        let wide = Page::new(RgbImage::from_pixel(60, 20, Rgb([0, 0, 0])));
        let pages = vec![square(40), wide, square(50)];
        let (out, canvas) = BatchNormalizer::default().normalize(pages).unwrap();
        assert_eq!(canvas, CanvasSize::new(40, 40));
        // 60x20 shrinks to 40x13, centred at y = 13.
        let page = out[1].image();
        assert_eq!(page.get_pixel(20, 12), &Rgb([255, 255, 255]));
        assert!(page.get_pixel(20, 19).0[0] < 40);
        assert_eq!(page.get_pixel(20, 26), &Rgb([255, 255, 255]));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = BatchNormalizer::default().normalize(Vec::new()).err().unwrap();
        assert!(matches!(err, FlatscanError::EmptyInput));
    }
}
