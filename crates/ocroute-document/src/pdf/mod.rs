// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page rasterization and single-page PDF creation.

pub mod raster;
pub mod writer;

pub use raster::{DocumentRasterizer, Rasterizer};
pub use writer::PdfWriter;
