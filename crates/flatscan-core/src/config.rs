// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FlatscanError;

/// Tunable parameters for one scanning batch.
///
/// Every field has a default, so a partial JSON file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub edges: EdgeConfig,
    pub rectify: RectifyConfig,
    pub refine: RefineConfig,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
    pub segmentation: SegmentationConfig,
}

/// Document boundary detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Gaussian sigma applied before edge detection (1.1 matches a 5x5 kernel).
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub dilate_iterations: u8,
    pub erode_iterations: u8,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 85.0,
            canny_high: 200.0,
            dilate_iterations: 2,
            erode_iterations: 1,
            approx_epsilon_ratio: 0.02,
        }
    }
}

/// Perspective rectification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Largest allowed ratio of rectified size to source size, per axis.
    pub max_inflation: f64,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self { max_inflation: 1.2 }
    }
}

/// Margin trimming, contrast enhancement and sharpening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Margins are only trimmed when both dimensions exceed this.
    pub min_trim_dimension: u32,
    /// Width of the border band that is tested and trimmed, in pixels.
    pub margin: u32,
    /// Mean intensity above which a border band counts as blank paper.
    pub margin_white_level: f64,
    pub clahe_clip_limit: f32,
    pub clahe_tile_grid: u32,
    /// Linear multiplier applied after sharpening.
    pub gain: f32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            min_trim_dimension: 20,
            margin: 10,
            margin_white_level: 200.0,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 8,
            gain: 1.5,
        }
    }
}

/// Cross-page canvas layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// RGB fill colour of the shared page canvas.
    pub background: [u8; 3],
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
        }
    }
}

/// Output document settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix of generated document file names.
    pub file_prefix: String,
    /// Resolution used to turn page pixels into physical page size.
    pub dpi: f32,
    /// Title embedded in the PDF metadata.
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_prefix: "document".into(),
            dpi: 72.0,
            title: "Scanned document".into(),
        }
    }
}

/// Background segmentation backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Background-removal model; `None` keeps photos unsegmented.
    pub model_path: Option<PathBuf>,
}

impl ScanConfig {
    /// Load a config file, then validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FlatscanError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file if it exists, otherwise return the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, FlatscanError> {
        if path.as_ref().is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FlatscanError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), FlatscanError> {
        let edges = &self.edges;
        if !(edges.blur_sigma > 0.0) {
            return Err(FlatscanError::Config("edges.blur_sigma must be positive".into()));
        }
        if edges.canny_low > edges.canny_high {
            return Err(FlatscanError::Config(format!(
                "edges.canny_low ({}) must not exceed edges.canny_high ({})",
                edges.canny_low, edges.canny_high
            )));
        }
        if !(edges.approx_epsilon_ratio > 0.0) {
            return Err(FlatscanError::Config(
                "edges.approx_epsilon_ratio must be positive".into(),
            ));
        }
        if !(self.rectify.max_inflation >= 1.0) {
            return Err(FlatscanError::Config(
                "rectify.max_inflation must be at least 1.0".into(),
            ));
        }
        if self.refine.clahe_tile_grid == 0 {
            return Err(FlatscanError::Config("refine.clahe_tile_grid must be at least 1".into()));
        }
        if !(self.refine.gain >= 0.0) {
            return Err(FlatscanError::Config("refine.gain must not be negative".into()));
        }
        if !(self.output.dpi > 0.0) {
            return Err(FlatscanError::Config("output.dpi must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.edges.canny_low, 85.0);
        assert_eq!(config.edges.canny_high, 200.0);
        assert_eq!(config.refine.clahe_tile_grid, 8);
        assert_eq!(config.layout.background, [255, 255, 255]);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{ "refine": { "gain": 1.2 }, "output": { "dpi": 150.0 } }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.refine.gain, 1.2);
        assert_eq!(config.refine.margin, 10);
        assert_eq!(config.output.dpi, 150.0);
        assert_eq!(config.output.file_prefix, "document");
        assert_eq!(config.edges, EdgeConfig::default());
    }

    #[test]
    fn inverted_canny_thresholds_rejected() {
        let mut config = ScanConfig::default();
        config.edges.canny_low = 250.0;
        assert!(matches!(config.validate(), Err(FlatscanError::Config(_))));
    }

    #[test]
    fn zero_tile_grid_rejected() {
        let mut config = ScanConfig::default();
        config.refine.clahe_tile_grid = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ScanConfig::default();
        config.output.title = "Receipts".into();
        config.save(&path).unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }
}
