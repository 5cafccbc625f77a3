// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline: drives a batch of photos through segmentation, boundary
// detection, rectification and refinement, then normalizes the batch and
// assembles the PDF.

use std::path::Path;
use std::sync::Arc;

use flatscan_core::config::ScanConfig;
use flatscan_core::error::FlatscanError;
use flatscan_core::{AssembledDocument, PageReport, Rectification, ScanReport};
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::geometry::BoundaryDetector;
use crate::image::processor::ImageProcessor;
use crate::pdf::writer::PdfWriter;
use crate::scan::enhance::PageRefiner;
use crate::scan::normalize::BatchNormalizer;
use crate::scan::page::Page;
use crate::scan::rectify::Rectifier;
use crate::scan::segment::{Segmenter, ensure_same_dimensions};

/// One decoded input photo.
pub struct SourceImage {
    /// Informational only; used in logs and the batch report.
    pub name: String,
    pub image: DynamicImage,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    /// Decode an uploaded image.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, FlatscanError> {
        let image = ImageProcessor::from_bytes(bytes)?.into_rgb();
        Ok(Self::new(name, DynamicImage::ImageRgb8(image)))
    }

    /// Decode a photo from disk, named after its file name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FlatscanError> {
        let path = path.as_ref();
        let image = DynamicImage::ImageRgb8(ImageProcessor::open(path)?.into_rgb());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, image))
    }
}

/// Everything one batch produces.
pub struct ScanOutput {
    pub document: AssembledDocument,
    /// The normalized pages, in input order.
    pub pages: Vec<Page>,
    pub report: ScanReport,
}

/// Photo-to-PDF scanner for one configuration.
///
/// Holds no per-batch state, so one pipeline can serve any number of batches.
/// The segmenter is shared behind an `Arc` so the expensive model is loaded
/// only once per process.
pub struct ScanPipeline {
    segmenter: Arc<dyn Segmenter>,
    detector: BoundaryDetector,
    rectifier: Rectifier,
    refiner: PageRefiner,
    normalizer: BatchNormalizer,
    writer: PdfWriter,
}

impl ScanPipeline {
    pub fn new(config: ScanConfig, segmenter: Arc<dyn Segmenter>) -> Self {
        Self {
            segmenter,
            detector: BoundaryDetector::new(config.edges),
            rectifier: Rectifier::new(config.rectify),
            refiner: PageRefiner::new(config.refine),
            normalizer: BatchNormalizer::new(config.layout.background),
            writer: PdfWriter::new(&config.output),
        }
    }

    /// Segment, rectify and refine a single photo.
    ///
    /// When no boundary is found the segmented photo is refined as-is.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn process_page(&self, image: &DynamicImage) -> Result<(Page, Rectification), FlatscanError> {
        let segmented = self.segmenter.segment(image)?;
        ensure_same_dimensions(image, &segmented)?;
        let rgb = ImageProcessor::from_dynamic(segmented).into_rgb();

        let (rectified, rectification) = match self.detector.detect(&rgb) {
            Some(boundary) => self.rectifier.rectify(rgb, &boundary),
            None => {
                warn!("No document boundary found; using the photo unrectified");
                (rgb, Rectification::Unchanged)
            }
        };

        let refined = self.refiner.refine(rectified);
        Ok((Page::new(refined), rectification))
    }

    /// Turn a batch of photos into one PDF.
    ///
    /// Pages are processed one at a time in input order. Normalization waits
    /// for every page, and any failure aborts the batch without producing a
    /// document.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub fn process(&self, inputs: Vec<SourceImage>) -> Result<ScanOutput, FlatscanError> {
        if inputs.is_empty() {
            return Err(FlatscanError::EmptyInput);
        }

        let mut pages = Vec::with_capacity(inputs.len());
        let mut page_reports = Vec::with_capacity(inputs.len());
        for (index, source) in inputs.into_iter().enumerate() {
            info!(page = index + 1, source = %source.name, "Processing page");
            let (page, rectification) = self.process_page(&source.image)?;
            page_reports.push(PageReport {
                source: source.name,
                rectification,
                refined_size: page.size(),
            });
            pages.push(page);
        }

        let (pages, canvas) = self.normalizer.normalize(pages)?;
        let document = self.writer.assemble(&pages)?;

        info!(
            file_name = %document.file_name,
            page_count = document.page_count,
            %canvas,
            "Batch complete"
        );
        Ok(ScanOutput {
            document,
            pages,
            report: ScanReport {
                canvas,
                pages: page_reports,
            },
        })
    }
}
