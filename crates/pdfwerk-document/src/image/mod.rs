// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — load replacement images and prepare them for PDF insertion.

pub mod processor;

pub use processor::{ImageProcessor, PdfImage, fit_rect};
