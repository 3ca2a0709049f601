// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk-document — Document processing for the pdfwerk editor.
//
// Reads page layouts (image placements and positioned text) from existing
// PDFs, prepares replacement images, writes scheduled replacements back, and
// holds the editor session that ties them together.

pub mod image;
pub mod pdf;
pub mod session;

#[cfg(test)]
mod test_fixtures;

// Re-export the primary structs so callers can use `pdfwerk_document::PdfReader` etc.
pub use image::processor::{ImageProcessor, REPLACEMENT_EXTENSIONS};
pub use pdf::edits::{ModificationLedger, Scheduled};
pub use pdf::reader::PdfReader;
pub use pdf::region::text_in_region;
pub use pdf::writer::PdfWriter;
pub use session::{EditorSession, SaveJob};
