// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine adapter: runs every configured recognition engine on a prepared
// page and normalises their output into validated text lines.

use image::GrayImage;
use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::{EngineLines, RawTextLine};
use tracing::{debug, instrument, warn};

/// A text recognition backend.
///
/// Engines are constructed once (model loading is expensive) and then reused
/// for every page of the batch.
pub trait RecognitionEngine {
    /// Stable identity used in candidate provenance, e.g. `"tesseract"`.
    fn name(&self) -> &str;

    /// Recognise text lines on a prepared grayscale image.
    ///
    /// Coordinates in the returned polygons are in the input image's pixel
    /// space. Records may be incomplete; the adapter validates them.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawTextLine>>;
}

/// Everything the engines produced for one page.
#[derive(Debug, Default)]
pub struct PageRecognition {
    /// One entry per engine that ran successfully, in configuration order.
    pub lines: Vec<EngineLines>,
    /// Engines that failed on this page. They contribute no lines.
    pub failures: Vec<OcrouteError>,
}

impl PageRecognition {
    pub fn line_count(&self) -> usize {
        self.lines.iter().map(|engine| engine.lines.len()).sum()
    }
}

/// Fans a page out to every configured engine.
pub struct OcrAdapter {
    engines: Vec<Box<dyn RecognitionEngine>>,
}

impl std::fmt::Debug for OcrAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrAdapter")
            .field("engines", &self.engine_names())
            .finish()
    }
}

impl OcrAdapter {
    /// Build an adapter over at least one engine.
    pub fn new(engines: Vec<Box<dyn RecognitionEngine>>) -> Result<Self> {
        if engines.is_empty() {
            return Err(OcrouteError::Config(
                "at least one recognition engine must be configured".into(),
            ));
        }
        Ok(Self { engines })
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|engine| engine.name()).collect()
    }

    /// Run all engines on `image`, tagging results with `page`.
    ///
    /// A failing engine is logged and recorded in [`PageRecognition::failures`];
    /// the remaining engines still run. Invalid records are dropped.
    #[instrument(skip(self, image), fields(page, width = image.width(), height = image.height()))]
    pub fn recognize_page(&self, image: &GrayImage, page: usize) -> PageRecognition {
        let mut result = PageRecognition::default();

        for engine in &self.engines {
            match engine.recognize(image) {
                Ok(raw_lines) => {
                    let total = raw_lines.len();
                    let lines: Vec<_> =
                        raw_lines.into_iter().filter_map(RawTextLine::validate).collect();
                    debug!(
                        engine = engine.name(),
                        total,
                        kept = lines.len(),
                        "Engine finished"
                    );
                    result.lines.push(EngineLines {
                        engine: engine.name().to_string(),
                        page,
                        lines,
                    });
                }
                Err(err) => {
                    warn!(engine = engine.name(), error = %err, "Recognition engine failed");
                    let err = match err {
                        OcrouteError::Engine { .. } => err,
                        other => OcrouteError::Engine {
                            engine: engine.name().to_string(),
                            reason: other.to_string(),
                        },
                    };
                    result.failures.push(err);
                }
            }
        }

        result
    }
}
