// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — loads settings, starts the speech worker, and
// provides the methods the Dioxus UI calls for anything outside the editor
// session itself.
//
// The speech worker lives behind `Arc<Mutex<>>` and shuts down when the last
// clone of the services is dropped.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pdfwerk_core::AppConfig;
use pdfwerk_core::error::{PdfwerkError, Result};
use pdfwerk_speech::{CommandEngine, SpeechWorker};
use tracing::{info, warn};

use super::data_dir;

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
#[derive(Clone)]
pub struct AppServices {
    speech: Arc<Mutex<Option<SpeechWorker>>>,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise all services. Call once at app startup.
    ///
    /// Missing or unreadable settings fall back to defaults, and a machine
    /// without a speech synthesiser simply has no Draw & Read mode.
    pub fn init() -> Self {
        let dir = data_dir::data_dir();
        info!(path = %dir.display(), "initialising app services");

        let config = load_config(&dir).unwrap_or_default();
        let speech = start_speech(config.speech_rate);

        Self {
            speech: Arc::new(Mutex::new(speech)),
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    // -- Speech --------------------------------------------------------------

    pub fn speech_available(&self) -> bool {
        self.speech.lock().expect("speech lock poisoned").is_some()
    }

    /// Name of the synthesiser in use, if any.
    pub fn speech_engine(&self) -> Option<String> {
        let guard = self.speech.lock().expect("speech lock poisoned");
        guard.as_ref().map(|worker| worker.engine_name().to_string())
    }

    /// Queue `text` for reading aloud.
    pub fn speak(&self, text: String) -> Result<()> {
        let guard = self.speech.lock().expect("speech lock poisoned");
        match guard.as_ref() {
            Some(worker) => worker.speak(text),
            None => Err(PdfwerkError::SpeechUnavailable),
        }
    }

    /// Stop the current utterance and drop everything queued.
    pub fn stop_speaking(&self) {
        if let Some(worker) = self.speech.lock().expect("speech lock poisoned").as_ref() {
            worker.stop();
        }
    }

    // -- Config Persistence --------------------------------------------------

    /// Get a clone of the current config.
    pub fn config(&self) -> AppConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    /// Update and persist the config.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        *self.config.lock().expect("config lock poisoned") = config.clone();
        persist_config(&self.data_dir, config)
    }
}

fn start_speech(rate: u32) -> Option<SpeechWorker> {
    let Some(engine) = CommandEngine::detect() else {
        warn!("TTS not available: no speech synthesiser found, Draw & Read is disabled");
        return None;
    };
    match SpeechWorker::spawn(engine, rate) {
        Ok(worker) => Some(worker),
        Err(e) => {
            warn!(error = %e, "TTS not available: speech worker failed to start");
            None
        }
    }
}

// -- Config file persistence -------------------------------------------------

const CONFIG_FILE: &str = "config.json";

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfwerk_core::Theme;

    #[test]
    fn config_round_trips_through_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(dir.path()).is_none());

        let config = AppConfig {
            theme: Theme::Dark,
            speech_rate: 180,
            ..AppConfig::default()
        };
        persist_config(dir.path(), &config).unwrap();
        assert_eq!(load_config(dir.path()), Some(config));
    }

    #[test]
    fn corrupt_config_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(load_config(dir.path()).is_none());
    }
}
