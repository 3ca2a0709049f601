// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Speech worker — a background thread that owns a `SpeechEngine` and speaks
// queued utterances in order.
//
// Stopping bumps a shared generation counter instead of tearing the thread
// down: utterances queued before the bump are skipped when they come up, and
// the one being spoken sees its `CancelToken` fire.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, error, info, warn};

use crate::engine::{CancelToken, SpeechEngine};

/// How long the worker waits on the channel before checking again.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

enum Message {
    Speak { text: String, generation: u64 },
    Shutdown,
}

/// Handle to the background speech thread.
pub struct SpeechWorker {
    sender: Sender<Message>,
    generation: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
    engine_name: String,
}

impl SpeechWorker {
    /// Start a worker that speaks with `engine` at `rate` words per minute.
    pub fn spawn<E: SpeechEngine + 'static>(engine: E, rate: u32) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let generation = Arc::new(AtomicU64::new(0));
        let engine_name = engine.name().to_string();

        let shared = Arc::clone(&generation);
        let handle = std::thread::Builder::new()
            .name("pdfwerk-speech".into())
            .spawn(move || run(engine, rate, receiver, shared))?;

        info!(engine = %engine_name, rate, "Speech worker started");
        Ok(Self {
            sender,
            generation,
            handle: Some(handle),
            engine_name,
        })
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    /// Queue `text` to be spoken after everything already queued.
    pub fn speak(&self, text: impl Into<String>) -> Result<()> {
        let message = Message::Speak {
            text: text.into(),
            generation: self.generation.load(Ordering::SeqCst),
        };
        self.sender
            .send(message)
            .map_err(|_| PdfwerkError::Speech("speech worker is not running".into()))
    }

    /// Cut off the current utterance and drop everything queued. The worker
    /// keeps accepting new text.
    pub fn stop(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Speech stopped");
    }

    /// Stop speaking and wait for the thread to exit.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop();
        let _ = self.sender.send(Message::Shutdown);
        if handle.join().is_err() {
            error!("Speech worker thread panicked");
        }
        info!("Speech worker shut down");
    }
}

impl Drop for SpeechWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<E: SpeechEngine>(mut engine: E, rate: u32, receiver: Receiver<Message>, generation: Arc<AtomicU64>) {
    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(Message::Speak { text, generation: queued }) => {
                if queued != generation.load(Ordering::SeqCst) {
                    debug!(chars = text.len(), "Skipping utterance queued before stop");
                    continue;
                }
                let cancel = CancelToken::new(queued, Arc::clone(&generation));
                if let Err(err) = engine.speak(&text, rate, &cancel) {
                    warn!(%err, engine = engine.name(), "Speech failed");
                }
            }
            Ok(Message::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}
