// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: region-of-interest crop, grayscale, and integer upscale.
// Operates on in-memory images using the `image` crate.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use ocroute_core::config::RoiFraction;
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let (gray, offset) = ImageProcessor::from_rgb(page)
///     .crop_fraction(&roi);
/// let gray = gray.grayscale().upscale(2).into_luma8();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap a rendered page raster.
    pub fn from_rgb(page: RgbImage) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(page),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return an 8-bit luma image.
    pub fn into_luma8(self) -> GrayImage {
        self.image.into_luma8()
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop a rectangular region from the image.
    ///
    /// Values are clamped to image bounds; the result is never empty unless the
    /// source is.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x).max(1).min(img_w);
        let safe_h = height.min(img_h - safe_y).max(1).min(img_h);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h);
        Self { image: cropped }
    }

    /// Crop to a fractional region of interest.
    ///
    /// Returns the cropped processor and the pixel offset of its top-left
    /// corner within the original image. Fractions are truncated to whole
    /// pixels.
    pub fn crop_fraction(self, roi: &RoiFraction) -> (Self, (u32, u32)) {
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let x1 = (w * roi.x.0) as u32;
        let x2 = (w * roi.x.1) as u32;
        let y1 = (h * roi.y.0) as u32;
        let y2 = (h * roi.y.1) as u32;
        let cropped = self.crop(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1));
        (cropped, (x1, y1))
    }

    /// Convert the image to grayscale (luma).
    pub fn grayscale(self) -> Self {
        Self {
            image: self.image.grayscale(),
        }
    }

    /// Enlarge by an integer factor with bicubic (Catmull-Rom) interpolation.
    #[instrument(skip(self), fields(factor))]
    pub fn upscale(self, factor: u32) -> Self {
        if factor <= 1 {
            return self;
        }
        let (w, h) = (self.image.width() * factor, self.image.height() * factor);
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            to_w = w,
            to_h = h,
            "Upscaling image"
        );
        Self {
            image: self.image.resize_exact(w, h, FilterType::CatmullRom),
        }
    }

}
