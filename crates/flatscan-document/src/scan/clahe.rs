// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalization (CLAHE) on 8-bit
// single-channel images.

use image::{GrayImage, Luma};
use tracing::debug;

const BINS: usize = 256;

/// CLAHE with a fixed clip limit and tile grid.
///
/// The image is divided into at most `grid` x `grid` tiles. Each tile gets a
/// clipped, redistributed histogram and a lookup table; every pixel is mapped
/// through the four nearest tile tables with bilinear weights.
#[derive(Debug, Clone, Copy)]
pub struct Clahe {
    clip_limit: f32,
    grid: u32,
}

impl Clahe {
    pub fn new(clip_limit: f32, grid: u32) -> Self {
        Self {
            clip_limit,
            grid: grid.max(1),
        }
    }

    pub fn apply(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return gray.clone();
        }

        let tile_w = width.div_ceil(self.grid.min(width));
        let tile_h = height.div_ceil(self.grid.min(height));
        let tiles_x = width.div_ceil(tile_w);
        let tiles_y = height.div_ceil(tile_h);
        debug!(tiles_x, tiles_y, tile_w, tile_h, "CLAHE tile layout");

        let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let x0 = tx * tile_w;
                let y0 = ty * tile_h;
                let x1 = (x0 + tile_w).min(width);
                let y1 = (y0 + tile_h).min(height);
                luts.push(self.tile_lut(gray, x0, y0, x1, y1));
            }
        }
        let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

        let inv_tw = 1.0 / tile_w as f32;
        let inv_th = 1.0 / tile_h as f32;
        let mut out = GrayImage::new(width, height);

        for y in 0..height {
            let tyf = y as f32 * inv_th - 0.5;
            let ty_floor = tyf.floor();
            let ya = tyf - ty_floor;
            let ty1 = (ty_floor.max(0.0) as u32).min(tiles_y - 1);
            let ty2 = ((ty_floor + 1.0).max(0.0) as u32).min(tiles_y - 1);

            for x in 0..width {
                let txf = x as f32 * inv_tw - 0.5;
                let tx_floor = txf.floor();
                let xa = txf - tx_floor;
                let tx1 = (tx_floor.max(0.0) as u32).min(tiles_x - 1);
                let tx2 = ((tx_floor + 1.0).max(0.0) as u32).min(tiles_x - 1);

                let v = gray.get_pixel(x, y).0[0] as usize;
                let top = lut_at(tx1, ty1)[v] as f32 * (1.0 - xa) + lut_at(tx2, ty1)[v] as f32 * xa;
                let bottom =
                    lut_at(tx1, ty2)[v] as f32 * (1.0 - xa) + lut_at(tx2, ty2)[v] as f32 * xa;
                let value = top * (1.0 - ya) + bottom * ya;
                out.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
            }
        }

        out
    }

    /// Clipped-histogram equalization table for one tile.
    fn tile_lut(&self, gray: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) -> [u8; BINS] {
        let mut hist = [0u32; BINS];
        for y in y0..y1 {
            for x in x0..x1 {
                hist[gray.get_pixel(x, y).0[0] as usize] += 1;
            }
        }
        let area = (x1 - x0) * (y1 - y0);

        if self.clip_limit > 0.0 {
            let clip = ((self.clip_limit * area as f32 / BINS as f32) as u32).max(1);
            let mut clipped = 0u32;
            for count in hist.iter_mut() {
                if *count > clip {
                    clipped += *count - clip;
                    *count = clip;
                }
            }

            // Spread the excess evenly, then hand out the remainder at a stride.
            let batch = clipped / BINS as u32;
            let mut residual = clipped - batch * BINS as u32;
            for count in hist.iter_mut() {
                *count += batch;
            }
            if residual > 0 {
                let step = (BINS as u32 / residual).max(1) as usize;
                for count in hist.iter_mut().step_by(step) {
                    if residual == 0 {
                        break;
                    }
                    *count += 1;
                    residual -= 1;
                }
            }
        }

        let scale = 255.0 / area as f32;
        let mut lut = [0u8; BINS];
        let mut cumulative = 0u32;
        for (entry, count) in lut.iter_mut().zip(hist) {
            cumulative += count;
            *entry = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
        }
        lut
    }
}
