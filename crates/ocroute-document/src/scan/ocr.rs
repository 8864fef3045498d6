// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrs recognition engine.
//
// A pure-Rust OCR engine backed by neural network models executed via `rten`.
// Only available with the `ocrs` feature:
//
// ```toml
// ocroute-document = { path = "crates/ocroute-document", features = ["ocrs"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`): locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`): decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads both to `~/.cache/ocrs/`.
//
// ocrs does not report per-line probabilities, so every line carries the
// configured nominal confidence.

use std::path::{Path, PathBuf};

use image::GrayImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::RawTextLine;
use rten::Model;
use rten_imageproc::RotatedRect;
use tracing::{debug, info, instrument};

use super::engine::RecognitionEngine;

const ENGINE_NAME: &str = "ocrs";

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Default directory for cached model files: `$XDG_CACHE_HOME/ocrs`, falling
/// back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Configuration for constructing an [`OcrsEngine`].
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
    /// Confidence assigned to every recognised line.
    pub nominal_confidence: f32,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            nominal_confidence: 0.90,
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(OcrouteError::Engine {
                    engine: ENGINE_NAME.into(),
                    reason: format!(
                        "model not found at {}; run `ocrs-cli` once to download models",
                        path.display()
                    ),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.nominal_confidence) {
            return Err(OcrouteError::Config(format!(
                "ocrs nominal confidence must lie in [0, 1], got {}",
                self.nominal_confidence
            )));
        }
        Ok(())
    }
}

/// Recognition engine backed by `ocrs`.
///
/// Model loading is the expensive step; build once and reuse for every page.
///
/// **Important:** `ocrs` and `rten` must be compiled in release mode. Debug
/// builds are 10-100x slower.
pub struct OcrsEngine {
    engine: OcrEngine,
    nominal_confidence: f32,
}

impl OcrsEngine {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrsConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path)
            .map_err(|err| engine_error(format!("failed to load detection model: {err}")))?;

        info!("Loading OCR recognition model");
        let recognition_model = Model::load_file(&config.recognition_model_path)
            .map_err(|err| engine_error(format!("failed to load recognition model: {err}")))?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| engine_error(format!("failed to initialise OCR engine: {err}")))?;

        info!("ocrs engine initialised");
        Ok(Self {
            engine,
            nominal_confidence: config.nominal_confidence,
        })
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(OcrsConfig::from_dir(dir))
    }
}

impl RecognitionEngine for OcrsEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawTextLine>> {
        // ocrs expects RGB8.
        let rgb = image::DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height))
            .map_err(|err| engine_error(format!("failed to create image source: {err}")))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| engine_error(format!("OCR preprocessing failed: {err}")))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| engine_error(format!("word detection failed: {err}")))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| engine_error(format!("line recognition failed: {err}")))?;

        let lines: Vec<RawTextLine> = line_texts
            .iter()
            .flatten()
            .map(|line| RawTextLine {
                text: Some(line.to_string()),
                confidence: Some(self.nominal_confidence),
                polygon: Some(rect_polygon(&line.rotated_rect())),
            })
            .collect();

        debug!(words = word_rects.len(), lines = lines.len(), "ocrs recognition complete");
        Ok(lines)
    }
}

fn engine_error(reason: String) -> OcrouteError {
    OcrouteError::Engine {
        engine: ENGINE_NAME.into(),
        reason,
    }
}

fn rect_polygon(rect: &RotatedRect) -> Vec<(f32, f32)> {
    rect.corners().iter().map(|point| (point.x, point.y)).collect()
}
