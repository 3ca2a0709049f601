// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for dialogs and the status bar.
//
// Every technical error is mapped to a plain sentence plus a suggestion. The
// severity drives whether the UI shows a warning or an error dialog.

use crate::error::PdfwerkError;

/// How the UI should present an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user skipped a step (no selection, wrong mode); shown as a warning.
    ActionRequired,
    /// Nothing went wrong, there was simply nothing to do.
    Informational,
    /// The operation failed.
    Failure,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Dialog title.
    pub title: &'static str,
    /// Plain summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `PdfwerkError` into a `HumanError` for display.
pub fn humanize_error(err: &PdfwerkError) -> HumanError {
    match err {
        PdfwerkError::NoDocument => HumanError {
            title: "No PDF",
            message: "Open a PDF first.".into(),
            suggestion: "Use \"Open PDF\" to choose a document.".into(),
            severity: Severity::ActionRequired,
        },
        PdfwerkError::NoSelection => HumanError {
            title: "No selection",
            message: "Click an image on the page to select it first.".into(),
            suggestion: "Switch to Select Image mode and click inside an image.".into(),
            severity: Severity::ActionRequired,
        },
        PdfwerkError::WrongMode { required } => HumanError {
            title: "Mode",
            message: format!("Switch to '{required}' mode first."),
            suggestion: "Choose the mode from the bar above the page.".into(),
            severity: Severity::ActionRequired,
        },
        PdfwerkError::NothingToSave => HumanError {
            title: "No changes",
            message: "There are no image replacements to save.".into(),
            suggestion: "Select an image and replace it before saving.".into(),
            severity: Severity::Informational,
        },
        PdfwerkError::SpeechUnavailable => HumanError {
            title: "Speech",
            message: "Text-to-speech is not available.".into(),
            suggestion: "Install espeak-ng (Linux) or use macOS, then restart.".into(),
            severity: Severity::ActionRequired,
        },
        PdfwerkError::PageOutOfRange { index, count } => HumanError {
            title: "Page",
            message: format!("Page {} does not exist (the document has {count}).", index + 1),
            suggestion: "Use Prev and Next to move between pages.".into(),
            severity: Severity::Failure,
        },
        PdfwerkError::PdfError(detail) => HumanError {
            title: "PDF",
            message: format!("The PDF could not be processed: {detail}"),
            suggestion: "Make sure the file is a valid, unencrypted PDF.".into(),
            severity: Severity::Failure,
        },
        PdfwerkError::ImageError(detail) => HumanError {
            title: "Image",
            message: format!("The image could not be used: {detail}"),
            suggestion: "Choose a PNG, JPEG, BMP, or GIF file.".into(),
            severity: Severity::Failure,
        },
        PdfwerkError::Speech(detail) => HumanError {
            title: "Speech",
            message: format!("Reading aloud failed: {detail}"),
            suggestion: "Try again, or check your speech synthesiser.".into(),
            severity: Severity::Failure,
        },
        PdfwerkError::Io(io) => HumanError {
            title: "File",
            message: format!("A file could not be read or written: {io}"),
            suggestion: "Check the path and your permissions.".into(),
            severity: Severity::Failure,
        },
        PdfwerkError::Serialization(detail) => HumanError {
            title: "Settings",
            message: format!("Settings could not be saved: {detail}"),
            suggestion: "Delete the settings file to restore defaults.".into(),
            severity: Severity::Failure,
        },
    }
}
