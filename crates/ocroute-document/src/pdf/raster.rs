// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization: turns a source document into RGB page images.
// PDFs go through PDFium; raster formats are decoded with `image`.

use std::path::Path;

use image::RgbImage;
use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::DocumentKind;
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument, warn};

/// Converts a source document into page rasters, in page order.
pub trait Rasterizer {
    /// Render the first `max_pages` pages (all pages when `None`).
    ///
    /// Fails with [`OcrouteError::Render`] when the document cannot be opened
    /// or has no pages.
    fn rasterize(&self, path: &Path, max_pages: Option<usize>) -> Result<Vec<RgbImage>>;
}

/// Default rasterizer: PDFium for PDFs, `image` for everything else.
pub struct DocumentRasterizer {
    /// `None` when the PDFium shared library could not be bound.
    pdfium: Option<Pdfium>,
    /// Zoom factor relative to 72 dpi.
    scale: f32,
}

impl DocumentRasterizer {
    /// Bind PDFium from the working directory, common library folders, or the
    /// system loader. A missing library only disables PDF input.
    pub fn new(scale: f32) -> Self {
        let pdfium = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/usr/local/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library());

        let pdfium = match pdfium {
            Ok(bindings) => {
                info!("PDFium bound");
                Some(Pdfium::new(bindings))
            }
            Err(err) => {
                warn!(error = %err, "PDFium library not found; PDF input disabled");
                None
            }
        };
        Self { pdfium, scale }
    }

    /// Rasterizer without PDF support, for image-only batches.
    pub fn images_only(scale: f32) -> Self {
        Self {
            pdfium: None,
            scale,
        }
    }

    pub fn supports_pdf(&self) -> bool {
        self.pdfium.is_some()
    }

    fn render_pdf(&self, path: &Path, max_pages: Option<usize>) -> Result<Vec<RgbImage>> {
        let document_name = display_name(path);
        let pdfium = self.pdfium.as_ref().ok_or_else(|| OcrouteError::Render {
            document: document_name.clone(),
            reason: "PDFium library is not available".into(),
        })?;

        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|err| OcrouteError::Render {
                    document: document_name.clone(),
                    reason: err.to_string(),
                })?;

        let page_count = document.pages().len() as usize;
        if page_count == 0 {
            return Err(OcrouteError::Render {
                document: document_name,
                reason: "document has no pages".into(),
            });
        }
        let limit = max_pages.unwrap_or(page_count).min(page_count);
        debug!(page_count, limit, "Rendering PDF pages");

        let mut images = Vec::with_capacity(limit);
        for (index, page) in document.pages().iter().take(limit).enumerate() {
            let pixel_width = (page.width().value * self.scale) as i32;
            let pixel_height = (page.height().value * self.scale) as i32;

            let bitmap = page
                .render_with_config(
                    &PdfRenderConfig::new()
                        .set_target_width(pixel_width)
                        .set_target_height(pixel_height)
                        .render_form_data(true)
                        .render_annotations(true),
                )
                .map_err(|err| OcrouteError::Render {
                    document: document_name.clone(),
                    reason: format!("page {}: {}", index + 1, err),
                })?;
            images.push(bitmap.as_image().to_rgb8());
        }
        Ok(images)
    }

    fn decode_image(&self, path: &Path) -> Result<Vec<RgbImage>> {
        let image = image::open(path).map_err(|err| OcrouteError::Render {
            document: display_name(path),
            reason: err.to_string(),
        })?;
        Ok(vec![image.to_rgb8()])
    }
}

impl Rasterizer for DocumentRasterizer {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn rasterize(&self, path: &Path, max_pages: Option<usize>) -> Result<Vec<RgbImage>> {
        let pages = match DocumentKind::from_path(path) {
            Some(DocumentKind::Pdf) => self.render_pdf(path, max_pages)?,
            Some(_) => self.decode_image(path)?,
            None => {
                return Err(OcrouteError::Render {
                    document: display_name(path),
                    reason: "unsupported file type".into(),
                });
            }
        };
        info!(pages = pages.len(), "Document rasterized");
        Ok(pages)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
