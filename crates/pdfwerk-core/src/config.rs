// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::types::Theme;

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Colour theme applied to the window chrome and canvas.
    pub theme: Theme,
    /// Display scale: canvas pixels per PDF point.
    pub zoom: f32,
    /// Speech rate in words per minute.
    pub speech_rate: u32,
    /// Extra margin, in canvas pixels, around images when hit-testing clicks.
    pub click_tolerance_px: f32,
    /// Keep the replacement image's proportions when fitting it into the
    /// target rectangle (centred), instead of stretching it.
    pub keep_aspect_ratio: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            zoom: 1.5,
            speech_rate: 150,
            click_tolerance_px: 8.0,
            keep_aspect_ratio: true,
        }
    }
}

impl AppConfig {
    /// Zoom clamped to a range the layout view can display.
    pub fn effective_zoom(&self) -> f32 {
        if self.zoom.is_finite() {
            self.zoom.clamp(0.25, 6.0)
        } else {
            1.5
        }
    }
}
