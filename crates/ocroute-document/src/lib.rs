// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocroute-document: page-level document processing for OCRoute.
//
// Provides PDF/image rasterization, the recognition preprocessing pipeline
// (crop, grayscale, upscale, denoise, binarize), the OCR engine adapter with
// its concrete engines, preview highlighting, and single-page PDF output.

pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `ocroute_document::Preprocessor` etc.
pub use image::processor::ImageProcessor;
pub use pdf::raster::{DocumentRasterizer, Rasterizer};
pub use pdf::writer::PdfWriter;
pub use scan::engine::{OcrAdapter, PageRecognition, RecognitionEngine};
pub use scan::highlight::highlight_outlines;
pub use scan::preprocess::{PreparedImage, Preprocessor};
pub use scan::tesseract::{TesseractConfig, TesseractEngine};

#[cfg(feature = "ocrs")]
pub use scan::ocr::{OcrsConfig, OcrsEngine};
