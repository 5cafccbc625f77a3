// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page refinement: blank-margin trimming, luminance-only local contrast
// enhancement, Laplacian sharpening and a final brightness gain.

use flatscan_core::config::RefineConfig;
use image::{GrayImage, Luma, Rgb, RgbImage};
use palette::{FromColor, Lab, Srgb};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::scan::clahe::Clahe;

/// Turns a rectified page into a clean, print-ready page.
///
/// Not idempotent: sharpening and gain change pixel values on every pass, so
/// each page must be refined exactly once.
pub struct PageRefiner {
    config: RefineConfig,
    clahe: Clahe,
}

impl PageRefiner {
    pub fn new(config: RefineConfig) -> Self {
        let clahe = Clahe::new(config.clahe_clip_limit, config.clahe_tile_grid);
        Self { config, clahe }
    }

    /// Run the full refinement pipeline:
    ///
    /// 1. Trim blank margins (only when both dimensions exceed the minimum)
    /// 2. CLAHE on the Lab lightness channel
    /// 3. Subtract the absolute Laplacian response
    /// 4. Multiply by the configured gain
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn refine(&self, image: RgbImage) -> RgbImage {
        let trimmed = self.trim_margins(image);
        let equalized = self.equalize_lightness(&trimmed);
        let sharpened = sharpen_laplacian(&equalized);
        let page = ImageProcessor::from_rgb(sharpened)
            .scale_intensity(self.config.gain)
            .into_rgb();
        info!(width = page.width(), height = page.height(), "Page refined");
        page
    }

    /// Strip near-white margin bands.
    ///
    /// Top+bottom and left+right are tested as two independent pairs against
    /// the untrimmed image; a pair is stripped only when both of its bands are
    /// brighter than the white level.
    pub fn trim_margins(&self, image: RgbImage) -> RgbImage {
        let (w, h) = image.dimensions();
        let min = self.config.min_trim_dimension;
        let m = self.config.margin;
        if w <= min || h <= min || m == 0 {
            return image;
        }

        let page = ImageProcessor::from_rgb(image);
        let white = self.config.margin_white_level;
        let trim_rows = h > 2 * m
            && page.mean_intensity(0, 0, w, m) > white
            && page.mean_intensity(0, h - m, w, m) > white;
        let trim_cols = w > 2 * m
            && page.mean_intensity(0, 0, m, h) > white
            && page.mean_intensity(w - m, 0, m, h) > white;
        debug!(trim_rows, trim_cols, "Margin test complete");

        if !trim_rows && !trim_cols {
            return page.into_rgb();
        }
        let (x, crop_w) = if trim_cols { (m, w - 2 * m) } else { (0, w) };
        let (y, crop_h) = if trim_rows { (m, h - 2 * m) } else { (0, h) };
        page.crop(x, y, crop_w, crop_h).into_rgb()
    }

    /// Apply CLAHE to Lab lightness only, leaving colour balance untouched.
    pub fn equalize_lightness(&self, image: &RgbImage) -> RgbImage {
        let (w, h) = image.dimensions();
        let mut chroma: Vec<(f32, f32)> = Vec::with_capacity((w * h) as usize);
        let mut lightness = GrayImage::new(w, h);

        for (x, y, pixel) in image.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let lab = Lab::from_color(Srgb::new(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
            ));
            let l8 = (lab.l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8;
            lightness.put_pixel(x, y, Luma([l8]));
            chroma.push((lab.a, lab.b));
        }

        let equalized = self.clahe.apply(&lightness);

        RgbImage::from_fn(w, h, |x, y| {
            let l = equalized.get_pixel(x, y).0[0] as f32 * 100.0 / 255.0;
            let (a, b) = chroma[(y * w + x) as usize];
            let rgb = Srgb::from_color(Lab::new(l, a, b));
            let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
            Rgb([to_u8(rgb.red), to_u8(rgb.green), to_u8(rgb.blue)])
        })
    }
}

impl Default for PageRefiner {
    fn default() -> Self {
        Self::new(RefineConfig::default())
    }
}

/// Subtract the absolute 4-neighbour Laplacian from every channel.
///
/// Kernel `[[0,1,0],[1,-4,1],[0,1,0]]`, mirrored at the borders without
/// repeating the edge pixel. Results are clamped to [0, 255].
pub fn sharpen_laplacian(image: &RgbImage) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    RgbImage::from_fn(w, h, |x, y| {
        let left = image.get_pixel(reflect(x as i64 - 1, w), y);
        let right = image.get_pixel(reflect(x as i64 + 1, w), y);
        let up = image.get_pixel(x, reflect(y as i64 - 1, h));
        let down = image.get_pixel(x, reflect(y as i64 + 1, h));
        let center = image.get_pixel(x, y);

        let mut out = [0u8; 3];
        for c in 0..3 {
            let c0 = center.0[c] as i32;
            let response = left.0[c] as i32 + right.0[c] as i32 + up.0[c] as i32
                + down.0[c] as i32
                - 4 * c0;
            out[c] = (c0 - response.abs()).clamp(0, 255) as u8;
        }
        Rgb(out)
    })
}

/// Mirror an out-of-range index back inside `0..len` (`-1 -> 1`, `len -> len-2`).
fn reflect(i: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let mirrored = if i < 0 {
        -i
    } else if i >= len {
        2 * len - 2 - i
    } else {
        i
    };
    mirrored.clamp(0, len - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with a dark block leaving `border` pixels of white all round.
    fn bordered_page(w: u32, h: u32, border: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            let inside = x >= border && x < w - border && y >= border && y < h - border;
            if inside { Rgb([30, 30, 30]) } else { Rgb([250, 250, 250]) }
        })
    }

    #[test]
    fn white_margins_trimmed_on_both_axes() {
        let out = PageRefiner::default().trim_margins(bordered_page(100, 80, 20));
        assert_eq!(out.dimensions(), (80, 60));
    }

    #[test]
    fn only_white_axis_is_trimmed() {
        // Dark left/right bands, white top/bottom bands.
        let img = RgbImage::from_fn(100, 80, |x, _| {
            if x < 10 || x >= 90 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let out = PageRefiner::default().trim_margins(img);
        assert_eq!(out.dimensions(), (100, 60));
    }

    #[test]
    fn one_dark_band_blocks_its_axis() {
        let mut img = RgbImage::from_pixel(60, 60, Rgb([255, 255, 255]));
        for x in 0..60 {
            for y in 50..60 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let out = PageRefiner::default().trim_margins(img);
        // Bottom band is dark, so rows stay; left/right bands average
        // (50*255)/60 = 212.5 > 200, so columns go.
        assert_eq!(out.dimensions(), (40, 60));
    }

    #[test]
    fn trim_is_idempotent_once_border_is_gone() {
        let refiner = PageRefiner::default();
        let once = refiner.trim_margins(bordered_page(100, 80, 10));
        assert_eq!(once.dimensions(), (80, 60));
        let twice = refiner.trim_margins(once.clone());
        assert_eq!(twice, once);
    }

    #[test]
    fn small_pages_are_not_trimmed_but_still_refined() {
        let img = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        let refiner = PageRefiner::default();
        assert_eq!(refiner.trim_margins(img.clone()).dimensions(), (20, 20));
        assert_eq!(refiner.refine(img).dimensions(), (20, 20));
    }

    #[test]
    fn blank_white_page_stays_white() {
        let img = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        let out = PageRefiner::default().refine(img);
        assert_eq!(out.dimensions(), (30, 30));
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn sharpen_leaves_flat_regions_alone() {
        let img = RgbImage::from_pixel(10, 10, Rgb([120, 60, 200]));
        assert_eq!(sharpen_laplacian(&img), img);
    }

    #[test]
    fn sharpen_darkens_both_sides_of_an_edge() {
        let img = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([100, 100, 100]) } else { Rgb([200, 200, 200]) }
        });
        let out = sharpen_laplacian(&img);
        // x=4: response = 100+200-200 = +100 -> 100-100 = 0
        assert_eq!(out.get_pixel(4, 5).0[0], 0);
        // x=5: response = 100-100 = -100 -> 200-100 = 100
        assert_eq!(out.get_pixel(5, 5).0[0], 100);
        assert_eq!(out.get_pixel(0, 5).0[0], 100);
        assert_eq!(out.get_pixel(9, 5).0[0], 200);
    }

    #[test]
    fn refine_is_not_idempotent() {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            let v = if (x / 8 + y / 8) % 2 == 0 { 90 } else { 140 };
            Rgb([v, v, v])
        });
        let refiner = PageRefiner::default();
        let once = refiner.refine(img);
        let twice = refiner.refine(once.clone());
        assert_ne!(once, twice);
    }

    fn lab_of(pixel: &Rgb<u8>) -> Lab {
        let [r, g, b] = pixel.0;
        Lab::from_color(Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0))
    }

    #[test]
    fn equalization_keeps_hue_and_chroma() {
        // Hue sweeps along x at chroma 20. Lightness ramps over L 45..55 inside
        // every 32-row band, so each CLAHE tile sees the same narrow histogram.
        let img = RgbImage::from_fn(256, 256, |x, y| {
            let hue = (x as f32 / 256.0 * 360.0).to_radians();
            let l = 45.0 + 10.0 * (y % 32) as f32 / 31.0;
            let rgb = Srgb::from_color(Lab::new(l, 20.0 * hue.cos(), 20.0 * hue.sin()));
            let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
            Rgb([to_u8(rgb.red), to_u8(rgb.green), to_u8(rgb.blue)])
        });
        let out = PageRefiner::default().equalize_lightness(&img);

        let (mut in_lo, mut in_hi) = (f32::MAX, f32::MIN);
        let (mut out_lo, mut out_hi) = (f32::MAX, f32::MIN);
        for (before, after) in img.pixels().zip(out.pixels()) {
            let (a, b) = (lab_of(before), lab_of(after));
            let hue_a = a.b.atan2(a.a).to_degrees();
            let hue_b = b.b.atan2(b.a).to_degrees();
            let drift = (hue_a - hue_b).abs();
            let drift = drift.min(360.0 - drift);
            assert!(drift < 4.0, "hue moved {drift} degrees: {before:?} -> {after:?}");

            let chroma = |lab: &Lab| lab.a.hypot(lab.b);
            assert!((chroma(&a) - chroma(&b)).abs() < 2.5, "{before:?} -> {after:?}");

            in_lo = in_lo.min(a.l);
            in_hi = in_hi.max(a.l);
            out_lo = out_lo.min(b.l);
            out_hi = out_hi.max(b.l);
        }
        assert!(
            out_hi - out_lo > 1.5 * (in_hi - in_lo),
            "lightness range {}..{} -> {}..{}",
            in_lo,
            in_hi,
            out_lo,
            out_hi
        );
    }

    #[test]
    fn reflect_mirrors_without_repeating_edge() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(2, 5), 2);
        assert_eq!(reflect(-1, 1), 0);
    }
}
