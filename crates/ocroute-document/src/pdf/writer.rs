// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: single-page artifacts from a page raster using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::RgbImage;
use ocroute_core::error::{OcrouteError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// A4 portrait in millimetres.
const A4_MM: (f32, f32) = (210.0, 297.0);

/// Nominal resolution used to size the embedded image before scaling.
const IMAGE_DPI: f32 = 150.0;

/// Creates single-page PDFs that carry one page raster.
pub struct PdfWriter {
    /// Page size in millimetres (width, height).
    page_mm: (f32, f32),
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(width_mm: f32, height_mm: f32) -> Self {
        Self {
            page_mm: (width_mm, height_mm),
            title: None,
        }
    }

    /// Writer producing A4 portrait pages.
    pub fn a4() -> Self {
        Self::new(A4_MM.0, A4_MM.1)
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Page size in points.
    pub fn page_size_pt(&self) -> (f32, f32) {
        (Mm(self.page_mm.0).into_pt().0, Mm(self.page_mm.1).into_pt().0)
    }

    // -- Image to PDF ---------------------------------------------------------

    /// Create a single-page PDF containing the given page raster.
    ///
    /// The image is scaled to fill the page while preserving its aspect ratio
    /// and centred on the other axis.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn create_from_image(&self, page: &RgbImage) -> Result<Vec<u8>> {
        if page.width() == 0 || page.height() == 0 {
            return Err(OcrouteError::Pdf("cannot embed an empty image".into()));
        }
        let (page_w, page_h) = (Mm(self.page_mm.0), Mm(self.page_mm.1));
        let title = self.title.as_deref().unwrap_or("OCRoute POD");

        let img_width = page.width() as usize;
        let img_height = page.height() as usize;
        let raw = RawImage {
            pixels: RawImageData::U8(page.as_raw().clone()),
            width: img_width,
            height: img_height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        let (page_w_pt, page_h_pt) = self.page_size_pt();
        let img_w_pt = img_width as f32 / IMAGE_DPI * 72.0;
        let img_h_pt = img_height as f32 / IMAGE_DPI * 72.0;

        let scale = (page_w_pt / img_w_pt).min(page_h_pt / img_h_pt);
        let rendered_w_pt = img_w_pt * scale;
        let rendered_h_pt = img_h_pt * scale;
        let x_offset = (page_w_pt - rendered_w_pt) / 2.0;
        let y_offset = (page_h_pt - rendered_h_pt) / 2.0;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        }];

        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        debug!(rendered_w_pt, rendered_h_pt, scale, "Image placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }

    // -- File output convenience ----------------------------------------------

    /// Create an image PDF and write it to `path`, replacing any existing file.
    pub fn write_image_to_file(&self, page: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.create_from_image(page)?;
        std::fs::write(path, &bytes).map_err(|err| OcrouteError::ArtifactWrite {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "Wrote image PDF");
        Ok(())
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::a4()
    }
}
