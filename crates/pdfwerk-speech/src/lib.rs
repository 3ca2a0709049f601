// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk-speech — Text-to-speech for the pdfwerk editor.
//
// A `SpeechEngine` speaks one utterance at a time; `SpeechWorker` runs an
// engine on its own thread behind a message channel so the UI never blocks
// on audio.

pub mod engine;
pub mod worker;

pub use engine::{CancelToken, CommandEngine, SpeechEngine, Synthesiser};
pub use worker::SpeechWorker;
