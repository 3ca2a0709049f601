// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Settings directory: `$XDG_DATA_HOME/pdfwerk`, else `~/.local/share/pdfwerk`.

use std::ffi::OsString;
use std::path::PathBuf;

const APP_DIR: &str = "pdfwerk";

/// Return the directory holding `config.json`, creating it if needed.
pub fn data_dir() -> PathBuf {
    let dir = resolve(std::env::var_os("XDG_DATA_HOME"), std::env::var_os("HOME"));
    if let Err(err) = std::fs::create_dir_all(&dir) {
        tracing::warn!(path = %dir.display(), error = %err, "could not create data directory");
    }
    dir
}

/// An empty `XDG_DATA_HOME` counts as unset.
fn resolve(xdg_data_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    let base = match (xdg_data_home.filter(|v| !v.is_empty()), home) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => PathBuf::from(home).join(".local").join("share"),
        (None, None) => std::env::temp_dir(),
    };
    base.join(APP_DIR)
}
