// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading page layouts, scheduling image replacements, and
// writing them back.

pub(crate) mod content;
pub mod edits;
pub(crate) mod fonts;
pub(crate) mod objects;
pub mod reader;
pub mod region;
pub mod writer;

pub use edits::{ModificationLedger, Scheduled};
pub use reader::PdfReader;
pub use writer::PdfWriter;
