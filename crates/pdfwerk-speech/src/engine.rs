// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Speech engines — the `SpeechEngine` seam and an implementation that drives
// a command-line synthesiser found on `PATH`.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pdfwerk_core::error::{PdfwerkError, Result};
use tracing::{debug, info, instrument};

/// How often a running synthesiser is checked for completion or cancellation.
const CHILD_POLL: Duration = Duration::from_millis(20);

/// Signals that the utterance being spoken has been abandoned.
///
/// A token belongs to one generation of queued speech; bumping the shared
/// counter cancels every token handed out before the bump.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl CancelToken {
    pub(crate) fn new(generation: u64, current: Arc<AtomicU64>) -> Self {
        Self { generation, current }
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self::new(0, Arc::new(AtomicU64::new(0)))
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }
}

/// Something that can read text aloud.
pub trait SpeechEngine: Send {
    /// Human-readable engine name for logs and the UI.
    fn name(&self) -> &str;

    /// Speak `text` at `rate` words per minute, blocking until it has been
    /// spoken or `cancel` fires.
    fn speak(&mut self, text: &str, rate: u32, cancel: &CancelToken) -> Result<()>;
}

/// Supported command-line synthesisers, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synthesiser {
    EspeakNg,
    Espeak,
    SpdSay,
    Say,
}

impl Synthesiser {
    pub const ALL: [Synthesiser; 4] = [
        Synthesiser::EspeakNg,
        Synthesiser::Espeak,
        Synthesiser::SpdSay,
        Synthesiser::Say,
    ];

    pub fn program(&self) -> &'static str {
        match self {
            Synthesiser::EspeakNg => "espeak-ng",
            Synthesiser::Espeak => "espeak",
            Synthesiser::SpdSay => "spd-say",
            Synthesiser::Say => "say",
        }
    }

    /// Arguments that make the program read text from stdin at `rate` wpm.
    pub fn args(&self, rate: u32) -> Vec<String> {
        match self {
            Synthesiser::EspeakNg | Synthesiser::Espeak => {
                vec!["-s".into(), rate.to_string(), "--stdin".into()]
            }
            // spd-say takes a relative rate in -100..=100; ~160 wpm is 0.
            Synthesiser::SpdSay => {
                let relative = ((rate as i64 - 160) / 2).clamp(-100, 100);
                vec!["-r".into(), relative.to_string(), "-w".into(), "-e".into()]
            }
            Synthesiser::Say => vec!["-r".into(), rate.to_string(), "-f".into(), "-".into()],
        }
    }
}

/// A synthesiser run as a child process, one process per utterance.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    synthesiser: Synthesiser,
    program: PathBuf,
}

impl CommandEngine {
    pub fn new(synthesiser: Synthesiser, program: impl Into<PathBuf>) -> Self {
        Self {
            synthesiser,
            program: program.into(),
        }
    }

    /// Find the first supported synthesiser on `PATH`.
    pub fn detect() -> Option<Self> {
        let path = std::env::var_os("PATH")?;
        let dirs: Vec<PathBuf> = std::env::split_paths(&path).collect();
        Self::detect_in(&dirs)
    }

    /// Find the first supported synthesiser in `dirs`.
    pub fn detect_in(dirs: &[PathBuf]) -> Option<Self> {
        let found = Synthesiser::ALL.iter().find_map(|synthesiser| {
            dirs.iter()
                .map(|dir| dir.join(synthesiser.program()))
                .find(|candidate| candidate.is_file())
                .map(|program| Self::new(*synthesiser, program))
        });
        match &found {
            Some(engine) => info!(program = %engine.program.display(), "Speech synthesiser found"),
            None => info!("No speech synthesiser on PATH"),
        }
        found
    }

    pub fn synthesiser(&self) -> Synthesiser {
        self.synthesiser
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl SpeechEngine for CommandEngine {
    fn name(&self) -> &str {
        self.synthesiser.program()
    }

    #[instrument(skip(self, text, cancel), fields(engine = self.synthesiser.program(), chars = text.len()))]
    fn speak(&mut self, text: &str, rate: u32, cancel: &CancelToken) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(self.synthesiser.args(rate))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                PdfwerkError::Speech(format!("failed to start {}: {}", self.program.display(), err))
            })?;

        // The text is fed from its own thread so a long selection cannot
        // hold off cancellation while the pipe is full.
        let feeder = match child.stdin.take() {
            Some(mut stdin) => {
                let bytes = text.as_bytes().to_vec();
                let spawned = std::thread::Builder::new()
                    .name("pdfwerk-speech-stdin".into())
                    .spawn(move || stdin.write_all(&bytes));
                match spawned {
                    Ok(handle) => Some(handle),
                    Err(err) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(PdfwerkError::Speech(format!("failed to send text: {}", err)));
                    }
                }
            }
            None => None,
        };

        let outcome = loop {
            if cancel.is_cancelled() {
                debug!("Utterance cancelled, stopping synthesiser");
                let _ = child.kill();
                let _ = child.wait();
                break Ok(());
            }
            match child.try_wait() {
                Ok(Some(status)) if status.success() => break Ok(()),
                Ok(Some(status)) => {
                    break Err(PdfwerkError::Speech(format!(
                        "{} exited with {}",
                        self.synthesiser.program(),
                        status
                    )));
                }
                Ok(None) => std::thread::sleep(CHILD_POLL),
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    break Err(err.into());
                }
            }
        };

        let written = match feeder {
            Some(handle) if handle.is_finished() => handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin feeder panicked"))),
            // Still blocked on the pipe; the thread ends once the last reader
            // closes it.
            _ => Ok(()),
        };
        outcome?;
        match written {
            // A synthesiser that exits early closes the pipe; its exit status
            // tells the real story.
            Err(err) if err.kind() != ErrorKind::BrokenPipe && !cancel.is_cancelled() => {
                Err(PdfwerkError::Speech(format!("failed to send text: {}", err)))
            }
            _ => Ok(()),
        }
    }
}
