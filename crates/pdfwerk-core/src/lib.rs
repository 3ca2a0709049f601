// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk — Core geometry, domain types, and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod types;

pub use config::AppConfig;
pub use error::PdfwerkError;
pub use geometry::{CanvasPoint, CanvasRect, PagePoint, PageRect};
pub use types::*;
