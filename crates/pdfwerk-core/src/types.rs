// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the pdfwerk editor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::PageRect;

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PageSize {
    /// US Letter, used when a page declares no MediaBox.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
        }
    }
}

/// An image painted somewhere on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// 0-based page index.
    pub page: usize,
    /// Bounding box of the painted image in page space.
    pub rect: PageRect,
    /// XObject resource name, or `None` for inline images.
    pub name: Option<String>,
}

/// A single glyph with its page-space box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub text: String,
    pub rect: PageRect,
}

/// Glyphs shown by one text-showing operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub glyphs: Vec<Glyph>,
    /// Effective font size in page units (font size scaled by the text and
    /// graphics matrices).
    pub font_size: f32,
    /// Baseline y in page space.
    pub baseline: f32,
}

impl TextRun {
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.text.as_str()).collect()
    }

    /// Bounding box of all glyphs, or `None` for an empty run.
    pub fn rect(&self) -> Option<PageRect> {
        let mut glyphs = self.glyphs.iter();
        let first = glyphs.next()?.rect;
        Some(glyphs.fold(first, |acc, g| acc.union(&g.rect)))
    }
}

/// Everything the layout view needs to draw one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageLayout {
    pub size: PageSize,
    pub images: Vec<ImagePlacement>,
    pub text_runs: Vec<TextRun>,
}

/// A scheduled replacement of the image occupying `target` on `page`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageModification {
    /// 0-based page index.
    pub page: usize,
    /// Area covered by the original image, in page space.
    pub target: PageRect,
    /// Replacement image file.
    pub image_path: PathBuf,
}

/// How clicks and drags on the canvas are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditMode {
    /// Click an image to select it for replacement.
    #[default]
    Select,
    /// Drag a rectangle to have its text read aloud.
    DrawAndRead,
}

impl EditMode {
    pub fn label(&self) -> &'static str {
        match self {
            EditMode::Select => "Select Image",
            EditMode::DrawAndRead => "Draw & Read",
        }
    }
}

/// Window colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// CSS colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
    pub button_background: &'static str,
    pub canvas_background: &'static str,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: "#f6f6f6",
                foreground: "#222",
                button_background: "#e0e0e0",
                canvas_background: "#ddd",
            },
            Theme::Dark => Palette {
                background: "#2b2b2b",
                foreground: "#f1f1f1",
                button_background: "#3a3a3a",
                canvas_background: "#444",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_rect_covers_all_glyphs() {
        let run = TextRun {
            glyphs: vec![
                Glyph {
                    text: "a".into(),
                    rect: PageRect::from_origin_size(0.0, 0.0, 5.0, 10.0),
                },
                Glyph {
                    text: "b".into(),
                    rect: PageRect::from_origin_size(5.0, 1.0, 5.0, 10.0),
                },
            ],
            font_size: 10.0,
            baseline: 8.0,
        };
        assert_eq!(run.text(), "ab");
        assert_eq!(run.rect(), Some(PageRect { x0: 0.0, y0: 0.0, x1: 10.0, y1: 11.0 }));
    }

    #[test]
    fn themes_serialise_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        for theme in [Theme::Light, Theme::Dark] {
            assert_eq!(serde_json::to_string(&theme).unwrap(), format!("\"{}\"", theme.name()));
        }
        assert_ne!(Theme::Light.palette(), Theme::Dark.palette());
    }
}
