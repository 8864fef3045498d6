// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition pipeline: preprocessing, OCR engines and the adapter that runs
// them, and preview highlighting.

pub mod engine;
pub mod highlight;
pub mod preprocess;
pub mod tesseract;

#[cfg(feature = "ocrs")]
pub mod ocr;

pub use engine::{OcrAdapter, PageRecognition, RecognitionEngine};
pub use preprocess::{PreparedImage, Preprocessor};
pub use tesseract::TesseractEngine;

#[cfg(feature = "ocrs")]
pub use ocr::OcrsEngine;
