// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application and pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{OcrouteError, Result};

/// Persistent application settings (`config.json`).
///
/// Pure convenience state: the last folders and prefix file the operator used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder scanned for source PDFs.
    pub source_folder: String,
    /// Folder that receives artifacts and the end-of-batch backup.
    pub output_folder: String,
    /// Prefix list file for prefix-constrained matching (may be empty).
    pub preamble_file: String,
}

/// Fractional region of interest. Bounds are fractions of width/height in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiFraction {
    pub x: (f32, f32),
    pub y: (f32, f32),
}

impl Default for RoiFraction {
    /// Full width, vertical band 30%-85%: the code field without header/footer.
    fn default() -> Self {
        Self {
            x: (0.00, 1.00),
            y: (0.30, 0.85),
        }
    }
}

impl RoiFraction {
    /// The whole image.
    pub fn full() -> Self {
        Self {
            x: (0.0, 1.0),
            y: (0.0, 1.0),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (axis, (lo, hi)) in [("x", self.x), ("y", self.y)] {
            if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo >= hi {
                return Err(OcrouteError::Config(format!(
                    "region of interest {axis} bounds ({lo}, {hi}) must satisfy 0 <= lo < hi <= 1"
                )));
            }
        }
        Ok(())
    }
}

/// Edge-preserving noise reduction parameters (bilateral filter).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenoiseParams {
    /// Neighbourhood diameter in pixels.
    pub diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for DenoiseParams {
    fn default() -> Self {
        Self {
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

/// Locally-adaptive binarization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Odd window size in pixels (31 → block radius 15).
    pub window: u32,
    /// Subtracted from the local weighted mean.
    pub constant: i32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            window: 31,
            constant: 2,
        }
    }
}

impl ThresholdParams {
    pub fn block_radius(&self) -> u32 {
        self.window / 2
    }
}

/// How artifact filenames are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingScheme {
    /// `<CODE>.pdf`
    #[default]
    Plain,
    /// `POD_<CODE>_<YYYYMMDDHHMM>.pdf`, time supplied at review.
    Timestamped,
}

/// Immutable pipeline settings, built once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Page zoom factor used when rasterizing PDFs.
    pub render_scale: f32,
    /// Number of leading pages recognised per document; `None` for all.
    pub max_pages: Option<usize>,
    pub roi: RoiFraction,
    /// Integer upscale applied after grayscale conversion.
    pub upscale_factor: u32,
    pub denoise: DenoiseParams,
    pub threshold: ThresholdParams,
    /// Required total length of a code.
    pub code_length: usize,
    /// Confidence below which a fused candidate is flagged for attention.
    pub review_threshold: f32,
    pub naming: NamingScheme,
    /// Write artifacts under `<output>/<source stem>/`.
    pub per_document_subfolder: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            render_scale: 3.0,
            max_pages: Some(1),
            roi: RoiFraction::default(),
            upscale_factor: 2,
            denoise: DenoiseParams::default(),
            threshold: ThresholdParams::default(),
            code_length: 10,
            review_threshold: 0.70,
            naming: NamingScheme::Plain,
            per_document_subfolder: false,
        }
    }
}

impl PipelineConfig {
    /// Reject settings that would make every document fail.
    pub fn validate(&self) -> Result<()> {
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(OcrouteError::Config(format!(
                "render scale must be positive, got {}",
                self.render_scale
            )));
        }
        if self.max_pages == Some(0) {
            return Err(OcrouteError::Config("max pages must be at least 1".into()));
        }
        self.roi.validate()?;
        if self.upscale_factor == 0 {
            return Err(OcrouteError::Config("upscale factor must be at least 1".into()));
        }
        if self.threshold.window < 3 || self.threshold.window % 2 == 0 {
            return Err(OcrouteError::Config(format!(
                "threshold window must be odd and >= 3, got {}",
                self.threshold.window
            )));
        }
        if self.code_length == 0 {
            return Err(OcrouteError::PatternConfig("code length must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.review_threshold) {
            return Err(OcrouteError::Config(format!(
                "review threshold must lie in [0, 1], got {}",
                self.review_threshold
            )));
        }
        Ok(())
    }
}
