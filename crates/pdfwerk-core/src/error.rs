// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdfwerk.

use thiserror::Error;

/// Top-level error type for all pdfwerk operations.
#[derive(Debug, Error)]
pub enum PdfwerkError {
    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    // -- Editor state --
    #[error("no document is open")]
    NoDocument,

    #[error("no image is selected")]
    NoSelection,

    #[error("operation requires {required} mode")]
    WrongMode { required: &'static str },

    #[error("there are no image replacements to save")]
    NothingToSave,

    // -- Speech --
    #[error("speech synthesis failed: {0}")]
    Speech(String),

    #[error("no speech synthesiser is available")]
    SpeechUnavailable,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfwerkError>;
