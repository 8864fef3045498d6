// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition preprocessing: crop to the code band, grayscale, upscale,
// edge-preserving denoise, and locally adaptive binarization.

use image::{GrayImage, Luma, RgbImage};
use ocroute_core::config::{DenoiseParams, PipelineConfig, RoiFraction, ThresholdParams};
use ocroute_core::types::Polygon;
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// A page raster prepared for recognition, plus the geometry needed to map
/// engine coordinates back onto the original page.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Binarized, upscaled crop of the page.
    pub image: GrayImage,
    /// Upscale factor applied after cropping.
    pub scale: f32,
    /// Top-left corner of the crop within the original page, in page pixels.
    pub offset: (u32, u32),
}

impl PreparedImage {
    /// Map a polygon from prepared-image coordinates to page coordinates.
    pub fn to_page_coordinates(&self, polygon: &Polygon) -> Polygon {
        polygon.unscale(self.scale, self.offset.0 as f32, self.offset.1 as f32)
    }
}

/// Deterministic page preprocessor. Built once from the pipeline config.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    roi: RoiFraction,
    upscale: u32,
    denoise: DenoiseParams,
    threshold: ThresholdParams,
}

impl Preprocessor {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            roi: config.roi,
            upscale: config.upscale_factor.max(1),
            denoise: config.denoise,
            threshold: config.threshold,
        }
    }

    /// Run the full preprocessing pipeline on one page raster.
    ///
    /// 1. Crop to the region of interest
    /// 2. Convert to grayscale
    /// 3. Upscale with bicubic interpolation
    /// 4. Bilateral filter
    /// 5. Adaptive threshold
    ///
    /// Input is not modified. Identical input always gives identical output.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn prepare(&self, page: &RgbImage) -> PreparedImage {
        let (cropped, offset) = ImageProcessor::from_rgb(page.clone()).crop_fraction(&self.roi);
        let gray = cropped.grayscale().upscale(self.upscale).into_luma8();

        let denoised = bilateral_filter(
            &gray,
            self.denoise.diameter,
            self.denoise.sigma_color,
            self.denoise.sigma_space,
        );
        let binary = adaptive_threshold(
            &denoised,
            self.threshold.block_radius(),
            self.threshold.constant,
        );

        debug!(
            out_w = binary.width(),
            out_h = binary.height(),
            offset_x = offset.0,
            offset_y = offset.1,
            "Page prepared for recognition"
        );

        PreparedImage {
            image: binary,
            scale: self.upscale as f32,
            offset,
        }
    }
}

// -- Denoise ------------------------------------------------------------------

/// Edge-preserving smoothing over a square `diameter` neighbourhood.
///
/// Each output pixel is the average of its neighbours weighted by spatial
/// distance (`sigma_space`) and intensity difference (`sigma_color`).
/// Degenerate parameters or an empty image return the input unchanged.
pub fn bilateral_filter(
    gray: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    if diameter < 2 || sigma_color <= 0.0 || sigma_space <= 0.0 || gray.is_empty() {
        return gray.clone();
    }
    imageproc::filter::bilateral_filter(gray, diameter, sigma_color, sigma_space)
}

// -- Binarization -------------------------------------------------------------

/// Adaptive thresholding to produce a black-and-white image.
///
/// For each pixel the threshold is the mean intensity within a `block_radius`
/// neighbourhood, minus `c`. Pixels darker than the local threshold become
/// black; others become white.
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, c: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);
    let mut output = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let local_mean = region_mean(&integral, width, height, x, y, block_radius);
            let threshold = (local_mean.round() as i32 - c).clamp(0, 255) as u8;
            let pixel_val = gray.get_pixel(x, y).0[0];
            let binary = if pixel_val < threshold { 0u8 } else { 255u8 };
            output.put_pixel(x, y, Luma([binary]));
        }
    }
    output
}

/// Summed-area table of a grayscale image, `(width+1) x (height+1)` with a
/// zero-padded border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value within a square region centred on (cx, cy), clamped to
/// the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

// -- Tests --------------------------------------------------------------------
