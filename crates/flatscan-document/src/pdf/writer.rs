// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: assemble normalized page images into one multi-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use flatscan_core::config::OutputConfig;
use flatscan_core::error::FlatscanError;
use flatscan_core::{AssembledDocument, DocumentName};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::scan::page::Page;

const MM_PER_INCH: f32 = 25.4;

/// Encodes a sequence of page images as one PDF, one image per page.
///
/// Each page is sized to its image at the configured resolution, so a batch
/// of normalized pages produces identically sized PDF pages.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
    /// Pixels per inch used to turn image pixels into page millimetres.
    dpi: f32,
    /// Prefix of the generated file name.
    file_prefix: String,
}

impl PdfWriter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            title: config.title.clone(),
            dpi: config.dpi,
            file_prefix: config.file_prefix.clone(),
        }
    }

    /// Physical page size for a `width` x `height` pixel image.
    fn page_dimensions(&self, width: u32, height: u32) -> (Mm, Mm) {
        (
            Mm(width as f32 / self.dpi * MM_PER_INCH),
            Mm(height as f32 / self.dpi * MM_PER_INCH),
        )
    }

    /// Append `pages` in order as the pages of one PDF.
    ///
    /// Fails with `EncodingFailure` when there are no pages or a page has no
    /// pixels.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn assemble(&self, pages: &[Page]) -> Result<AssembledDocument, FlatscanError> {
        if pages.is_empty() {
            return Err(FlatscanError::EncodingFailure(
                "cannot build a document with no pages".into(),
            ));
        }

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for (index, page) in pages.iter().enumerate() {
            let (width, height) = (page.width(), page.height());
            if width == 0 || height == 0 {
                return Err(FlatscanError::EncodingFailure(format!(
                    "page {} has no pixels ({}x{})",
                    index + 1,
                    width,
                    height
                )));
            }

            let raw = RawImage {
                pixels: RawImageData::U8(page.image().as_raw().clone()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // Native size at the page dpi fills the page exactly.
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];

            let (page_w, page_h) = self.page_dimensions(width, height);
            debug!(page = index + 1, width, height, page_w = page_w.0, page_h = page_h.0, "Page placed");
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        let page_count = pdf_pages.len();
        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation produced warnings");
        }
        if bytes.is_empty() {
            return Err(FlatscanError::EncodingFailure("PDF serialisation produced no output".into()));
        }

        let file_name = DocumentName::generate(&self.file_prefix);
        info!(%file_name, page_count, bytes = bytes.len(), "Document assembled");

        Ok(AssembledDocument {
            bytes,
            file_name,
            page_count,
        })
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(&OutputConfig::default())
    }
}
