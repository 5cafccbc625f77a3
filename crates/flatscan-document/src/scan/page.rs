// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use flatscan_core::CanvasSize;
use image::RgbImage;

/// One fully processed document page.
///
/// Pages are owned values: every stage takes a page and hands back a new one,
/// so no two stages ever share a pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    image: RgbImage,
}

impl Page {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width(), self.height())
    }

    pub fn area(&self) -> u64 {
        self.size().area()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}
