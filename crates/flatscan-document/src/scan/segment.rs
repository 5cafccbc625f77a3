// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Foreground segmentation: isolating the document from its background
// before boundary detection.
//
// # Feature Gate
//
// The model-backed segmenter is only available when the `segment-model`
// feature is enabled:
//
// ```toml
// flatscan-document = { path = "crates/flatscan-document", features = ["segment-model"] }
// ```
//
// Without it, [`PassthroughSegmenter`] leaves photos untouched and boundary
// detection runs on the raw frame.

use flatscan_core::error::FlatscanError;
use image::DynamicImage;

/// Separates the foreground document from the rest of the photo.
///
/// Implementations must return an image with the same dimensions as their
/// input. Background pixels should be a flat neutral colour so that the page
/// edge is the strongest contour left in the frame.
pub trait Segmenter: Send + Sync {
    fn segment(&self, image: &DynamicImage) -> Result<DynamicImage, FlatscanError>;
}

/// Returns every photo unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughSegmenter;

impl Segmenter for PassthroughSegmenter {
    fn segment(&self, image: &DynamicImage) -> Result<DynamicImage, FlatscanError> {
        Ok(image.clone())
    }
}

/// Fail unless a segmenter preserved the frame size.
pub fn ensure_same_dimensions(
    input: &DynamicImage,
    output: &DynamicImage,
) -> Result<(), FlatscanError> {
    if input.width() != output.width() || input.height() != output.height() {
        return Err(FlatscanError::Segmentation(format!(
            "segmenter changed frame size from {}x{} to {}x{}",
            input.width(),
            input.height(),
            output.width(),
            output.height()
        )));
    }
    Ok(())
}

#[cfg(feature = "segment-model")]
pub use model::ModelSegmenter;

#[cfg(feature = "segment-model")]
mod model {
    use std::path::Path;

    use flatscan_core::config::SegmentationConfig;
    use flatscan_core::error::FlatscanError;
    use image::imageops::FilterType;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
    use rten::Model;
    use rten_tensor::NdTensor;
    use rten_tensor::prelude::*;
    use tracing::{debug, info, instrument};

    use super::Segmenter;

    /// Square input resolution of the salient-object model.
    const MODEL_SIZE: u32 = 320;
    const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
    const STD: [f32; 3] = [0.229, 0.224, 0.225];

    /// Salient-object segmenter backed by a U²-Net style `.rten` model.
    ///
    /// Loading the model is the expensive step. Construct one at startup and
    /// share it between batches behind an `Arc`.
    ///
    /// **Important:** `rten` must be compiled in release mode; debug builds
    /// are 10-100x slower.
    pub struct ModelSegmenter {
        model: Model,
    }

    impl ModelSegmenter {
        /// Load the model named by `config.model_path`.
        #[instrument(skip_all)]
        pub fn load(config: &SegmentationConfig) -> Result<Self, FlatscanError> {
            let path = config.model_path.as_deref().ok_or_else(|| {
                FlatscanError::Segmentation("no segmentation model configured".into())
            })?;
            Self::from_path(path)
        }

        #[instrument(fields(path = %path.display()))]
        pub fn from_path(path: &Path) -> Result<Self, FlatscanError> {
            if !path.exists() {
                return Err(FlatscanError::Segmentation(format!(
                    "segmentation model not found at {}",
                    path.display()
                )));
            }

            info!("Loading segmentation model");
            let model = Model::load_file(path).map_err(|err| {
                FlatscanError::Segmentation(format!(
                    "failed to load segmentation model from {}: {}",
                    path.display(),
                    err
                ))
            })?;

            info!("Segmentation model ready");
            Ok(Self { model })
        }

        /// Run the model and return a foreground mask at the source size.
        fn predict_mask(&self, rgb: &RgbImage) -> Result<GrayImage, FlatscanError> {
            let resized = image::imageops::resize(rgb, MODEL_SIZE, MODEL_SIZE, FilterType::Lanczos3);

            let size = MODEL_SIZE as usize;
            let mut input = NdTensor::<f32, 4>::zeros([1, 3, size, size]);
            for (x, y, pixel) in resized.enumerate_pixels() {
                for c in 0..3 {
                    let value = pixel.0[c] as f32 / 255.0;
                    input[[0, c, y as usize, x as usize]] = (value - MEAN[c]) / STD[c];
                }
            }

            let output = self
                .model
                .run_one(input.view().into(), None)
                .map_err(|err| FlatscanError::Segmentation(format!("model inference failed: {}", err)))?;
            let prediction: NdTensor<f32, 4> = output.try_into().map_err(|err| {
                FlatscanError::Segmentation(format!("unexpected model output: {:?}", err))
            })?;

            let [_, _, out_h, out_w] = prediction.shape();
            if out_h == 0 || out_w == 0 {
                return Err(FlatscanError::Segmentation("model produced an empty mask".into()));
            }

            let (mut lo, mut hi) = (f32::MAX, f32::MIN);
            for y in 0..out_h {
                for x in 0..out_w {
                    let v = prediction[[0, 0, y, x]];
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
            }
            let range = if hi > lo { hi - lo } else { 1.0 };
            debug!(lo, hi, "Mask range");

            let mask = GrayImage::from_fn(out_w as u32, out_h as u32, |x, y| {
                let v = (prediction[[0, 0, y as usize, x as usize]] - lo) / range;
                Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
            });

            Ok(image::imageops::resize(
                &mask,
                rgb.width(),
                rgb.height(),
                FilterType::Triangle,
            ))
        }
    }

    impl Segmenter for ModelSegmenter {
        #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
        fn segment(&self, image: &DynamicImage) -> Result<DynamicImage, FlatscanError> {
            let rgb = image.to_rgb8();
            let mask = self.predict_mask(&rgb)?;

            // Composite over black.
            let cutout = RgbImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let alpha = mask.get_pixel(x, y).0[0] as u32;
                let p = rgb.get_pixel(x, y).0;
                let blend = |c: u8| ((c as u32 * alpha + 127) / 255) as u8;
                Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
            });

            info!("Background removed");
            Ok(DynamicImage::ImageRgb8(cutout))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn missing_model_is_a_segmentation_error() {
            let err = ModelSegmenter::from_path(Path::new("/nonexistent/u2netp.rten"))
                .err()
                .unwrap();
            assert!(matches!(err, FlatscanError::Segmentation(_)));
        }

        #[test]
        fn unconfigured_model_is_a_segmentation_error() {
            let err = ModelSegmenter::load(&SegmentationConfig::default()).err().unwrap();
            assert!(matches!(err, FlatscanError::Segmentation(_)));
        }
    }
}
