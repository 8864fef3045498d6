// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview highlighting: outlines the lines that produced candidate codes on
// the page raster shown to the reviewer.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_polygon_mut;
use imageproc::point::Point;
use ocroute_core::types::Polygon;

/// Outline colour.
pub const HIGHLIGHT: Rgb<u8> = Rgb([255, 0, 0]);

/// Draw each polygon in red, roughly three pixels wide.
///
/// Polygons must already be in page coordinates. Degenerate outlines (fewer
/// than three distinct vertices) are skipped.
pub fn highlight_outlines(preview: &mut RgbImage, outlines: &[Polygon]) {
    for outline in outlines {
        let mut points: Vec<Point<f32>> = outline
            .points()
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .collect();
        // The polygon is closed implicitly.
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            continue;
        }

        for dy in -1..=1 {
            for dx in -1..=1 {
                let shifted: Vec<Point<f32>> = points
                    .iter()
                    .map(|p| Point::new(p.x + dx as f32, p.y + dy as f32))
                    .collect();
                draw_hollow_polygon_mut(preview, &shifted, HIGHLIGHT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_is_drawn_on_the_border_only() {
        let mut preview = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        highlight_outlines(&mut preview, &[Polygon::from_rect(10.0, 10.0, 30.0, 20.0)]);

        assert_eq!(*preview.get_pixel(20, 10), HIGHLIGHT);
        assert_eq!(*preview.get_pixel(20, 11), HIGHLIGHT);
        assert_eq!(*preview.get_pixel(25, 20), Rgb([255, 255, 255]));
    }

    #[test]
    fn degenerate_outline_is_ignored() {
        let mut preview = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let snapshot = preview.clone();
        highlight_outlines(&mut preview, &[Polygon(vec![(1.0, 1.0), (5.0, 5.0)])]);
        assert_eq!(preview, snapshot);
    }

    #[test]
    fn outline_off_canvas_does_not_panic() {
        let mut preview = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        highlight_outlines(&mut preview, &[Polygon::from_rect(-50.0, -50.0, 500.0, 500.0)]);
    }
}
