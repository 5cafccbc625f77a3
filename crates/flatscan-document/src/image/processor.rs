// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding, cropping, downscale-only fitting, intensity
// gain and canvas placement for RGB page images, using the `image` crate.

use flatscan_core::error::FlatscanError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Pixel, Rgb, RgbImage};
use tracing::{debug, info, instrument};

/// Page-image operations on a single in-memory RGB image.
///
/// Each method consumes `self` and returns a new `ImageProcessor`, so stages
/// chain without aliasing one another's buffers.
///
/// ```ignore
/// let page = ImageProcessor::open("photo.jpg")?
///     .crop(10, 10, 400, 600)
///     .fit_within(300, 300)
///     .place_on_canvas(300, 300, [255, 255, 255])
///     .into_rgb();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: RgbImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, FlatscanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            FlatscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self::from_dynamic(img))
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, FlatscanError> {
        let img = image::load_from_memory(data).map_err(|err| {
            FlatscanError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self::from_dynamic(img))
    }

    /// Convert an already-decoded image to 8-bit RGB.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
        }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    /// Mean luma of a rectangular region, clamped to the image bounds.
    ///
    /// An empty region has mean 0.
    pub fn mean_intensity(&self, x: u32, y: u32, width: u32, height: u32) -> f64 {
        let x_end = x.saturating_add(width).min(self.image.width());
        let y_end = y.saturating_add(height).min(self.image.height());
        if x >= x_end || y >= y_end {
            return 0.0;
        }

        let mut sum = 0u64;
        for yy in y..y_end {
            for xx in x..x_end {
                sum += self.image.get_pixel(xx, yy).to_luma().0[0] as u64;
            }
        }
        sum as f64 / ((x_end - x) as u64 * (y_end - y) as u64) as f64
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop a rectangular region from the image.
    ///
    /// `x` and `y` are the top-left corner; `width` and `height` define the
    /// size of the crop rectangle. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x);
        let safe_h = height.min(img_h - safe_y);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = image::imageops::crop_imm(&self.image, safe_x, safe_y, safe_w, safe_h);
        Self {
            image: cropped.to_image(),
        }
    }

    /// Shrink the image to fit within `max_width` x `max_height`, preserving
    /// aspect ratio. Images that already fit are returned untouched; this
    /// never upscales. Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        let (w, h) = self.image.dimensions();
        if w <= max_width && h <= max_height {
            return self;
        }

        let scale = (max_width as f64 / w as f64).min(max_height as f64 / h as f64);
        let new_w = ((w as f64 * scale).round() as u32).clamp(1, max_width.max(1));
        let new_h = ((h as f64 * scale).round() as u32).clamp(1, max_height.max(1));

        debug!(from_w = w, from_h = h, new_w, new_h, "Downscaling image");
        Self {
            image: image::imageops::resize(&self.image, new_w, new_h, FilterType::Lanczos3),
        }
    }

    /// Multiply every channel by `gain`, rounding and clamping to [0, 255].
    pub fn scale_intensity(mut self, gain: f32) -> Self {
        for pixel in self.image.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 * gain).round().clamp(0.0, 255.0) as u8;
            }
        }
        self
    }

    /// Paste the image centred on a fresh `width` x `height` canvas filled with
    /// `background`. The offset on each axis is floor((canvas - image) / 2);
    /// anything larger than the canvas is clipped.
    pub fn place_on_canvas(self, width: u32, height: u32, background: [u8; 3]) -> Self {
        let mut canvas = RgbImage::from_pixel(width, height, Rgb(background));
        let offset_x = (width as i64 - self.image.width() as i64) / 2;
        let offset_y = (height as i64 - self.image.height() as i64) / 2;
        image::imageops::overlay(&mut canvas, &self.image, offset_x.max(0), offset_y.max(0));
        Self { image: canvas }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, FlatscanError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| FlatscanError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_within_never_upscales() {
        let img = RgbImage::from_pixel(40, 30, Rgb([10, 20, 30]));
        let out = ImageProcessor::from_rgb(img).fit_within(400, 300);
        assert_eq!((out.width(), out.height()), (40, 30));
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let img = RgbImage::from_pixel(400, 200, Rgb([0, 0, 0]));
        let out = ImageProcessor::from_rgb(img).fit_within(100, 100);
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let img = RgbImage::from_pixel(50, 40, Rgb([0, 0, 0]));
        let out = ImageProcessor::from_rgb(img).crop(30, 30, 100, 100);
        assert_eq!((out.width(), out.height()), (20, 10));
    }

    #[test]
    fn gain_saturates() {
        let img = RgbImage::from_pixel(2, 2, Rgb([100, 200, 0]));
        let out = ImageProcessor::from_rgb(img).scale_intensity(1.5).into_rgb();
        assert_eq!(out.get_pixel(0, 0), &Rgb([150, 255, 0]));
    }

    #[test]
    fn canvas_centres_with_floor_offset() {
        let img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        let out = ImageProcessor::from_rgb(img)
            .place_on_canvas(8, 7, [255, 255, 255])
            .into_rgb();
        assert_eq!(out.dimensions(), (8, 7));
        // offset = ((8-3)/2, (7-2)/2) = (2, 2)
        assert_eq!(out.get_pixel(1, 2), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(2, 2), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(4, 3), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(5, 3), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(2, 4), &Rgb([255, 255, 255]));
    }

    #[test]
    fn mean_intensity_of_band() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        for y in 0..5 {
            for x in 0..20 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let proc = ImageProcessor::from_rgb(img);
        assert!((proc.mean_intensity(0, 0, 20, 5) - 255.0).abs() < 1e-9);
        assert!((proc.mean_intensity(0, 0, 20, 10) - 127.5).abs() < 1e-9);
        assert_eq!(proc.mean_intensity(25, 0, 5, 5), 0.0);
    }

    #[test]
    fn png_round_trip_keeps_dimensions() {
        let img = RgbImage::from_pixel(7, 5, Rgb([1, 2, 3]));
        let bytes = ImageProcessor::from_rgb(img).to_png_bytes().unwrap();
        let back = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!((back.width(), back.height()), (7, 5));
    }

    #[test]
    fn undecodable_bytes_are_image_errors() {
        let err = ImageProcessor::from_bytes(b"not an image").err().unwrap();
        assert!(matches!(err, FlatscanError::ImageError(_)));
    }
}
