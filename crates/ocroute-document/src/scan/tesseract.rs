// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract recognition engine.
//
// Runs the `tesseract` command-line tool on a temporary PNG and parses its TSV
// output. Word rows are grouped into lines by (page, block, paragraph, line);
// a line's confidence is the mean of its word confidences.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use image::{GrayImage, ImageFormat};
use ocroute_core::error::{OcrouteError, Result};
use ocroute_core::types::{Polygon, RawTextLine};
use tracing::{debug, instrument};

use super::engine::RecognitionEngine;

const ENGINE_NAME: &str = "tesseract";

/// TSV row level for individual words.
const WORD_LEVEL: u32 = 5;

/// Configuration for the Tesseract subprocess.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Executable name or path.
    pub binary: PathBuf,
    /// Language list in Tesseract syntax, e.g. `eng` or `ita+eng`.
    pub languages: String,
    /// Page segmentation mode. 6 = single uniform block of text.
    pub psm: u32,
    /// Restrict recognised characters, e.g. `0123456789` for digit-only codes.
    pub char_whitelist: Option<String>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            languages: "eng".into(),
            psm: 6,
            char_whitelist: None,
        }
    }
}

/// Recognition engine backed by the Tesseract CLI.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Check that the configured binary runs.
    pub fn probe(&self) -> Result<String> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .map_err(|err| self.failure(format!("failed to run tesseract (is it installed?): {err}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn failure(&self, reason: impl Into<String>) -> OcrouteError {
        OcrouteError::Engine {
            engine: ENGINE_NAME.into(),
            reason: reason.into(),
        }
    }

    fn run_tsv(&self, image_path: &std::path::Path) -> Result<String> {
        let mut command = Command::new(&self.config.binary);
        command
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.languages)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(self.config.psm.to_string());
        if let Some(whitelist) = &self.config.char_whitelist {
            command
                .arg("-c")
                .arg(format!("tessedit_char_whitelist={whitelist}"));
        }
        command.arg("tsv");

        let output = command
            .output()
            .map_err(|err| self.failure(format!("failed to run tesseract (is it installed?): {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("tesseract failed: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawTextLine>> {
        let temp = tempfile::Builder::new()
            .prefix("ocroute-")
            .suffix(".png")
            .tempfile()
            .map_err(|err| self.failure(format!("cannot create temporary image: {err}")))?;
        image
            .save_with_format(temp.path(), ImageFormat::Png)
            .map_err(|err| self.failure(format!("cannot write temporary image: {err}")))?;

        let tsv = self.run_tsv(temp.path())?;
        let lines = parse_tsv(&tsv);
        debug!(lines = lines.len(), "Tesseract output parsed");
        Ok(lines)
    }
}

// -- TSV parsing --------------------------------------------------------------

#[derive(Default)]
struct LineAccumulator {
    words: Vec<String>,
    confidences: Vec<f32>,
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
}

impl LineAccumulator {
    fn push(&mut self, word: &str, confidence: f32, rect: (u32, u32, u32, u32)) {
        let (left, top, width, height) = rect;
        if self.words.is_empty() {
            self.left = left;
            self.top = top;
            self.right = left.saturating_add(width);
            self.bottom = top.saturating_add(height);
        } else {
            self.left = self.left.min(left);
            self.top = self.top.min(top);
            self.right = self.right.max(left.saturating_add(width));
            self.bottom = self.bottom.max(top.saturating_add(height));
        }
        self.words.push(word.to_string());
        self.confidences.push(confidence);
    }

    fn finish(self) -> RawTextLine {
        let mean = self.confidences.iter().sum::<f32>() / self.confidences.len() as f32;
        let polygon = Polygon::from_rect(
            self.left as f32,
            self.top as f32,
            (self.right - self.left) as f32,
            (self.bottom - self.top) as f32,
        );
        RawTextLine {
            text: Some(self.words.join(" ")),
            confidence: Some((mean / 100.0).clamp(0.0, 1.0)),
            polygon: Some(polygon.0),
        }
    }
}

/// Parse Tesseract TSV output into one raw record per text line.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. Non-word rows, rows with negative confidence,
/// blank words, and malformed rows are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<RawTextLine> {
    let mut groups: BTreeMap<(u32, u32, u32, u32), LineAccumulator> = BTreeMap::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let numbers: Option<Vec<u32>> = cols[..10].iter().map(|c| c.trim().parse().ok()).collect();
        let Some(numbers) = numbers else {
            continue;
        };
        if numbers[0] != WORD_LEVEL {
            continue;
        }
        let Ok(confidence) = cols[10].trim().parse::<f32>() else {
            continue;
        };
        let word = cols[11].trim();
        if confidence < 0.0 || word.is_empty() {
            continue;
        }
        let key = (numbers[1], numbers[2], numbers[3], numbers[4]);
        groups
            .entry(key)
            .or_default()
            .push(word, confidence, (numbers[6], numbers[7], numbers[8], numbers[9]));
    }

    groups.into_values().map(LineAccumulator::finish).collect()
}
