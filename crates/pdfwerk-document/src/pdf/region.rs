// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region text assembly — turn the glyphs inside a rectangle into readable
// lines for speech.

use pdfwerk_core::{PageRect, TextRun};

/// Glyphs closer than this fraction of the font size share a line.
const LINE_TOLERANCE: f32 = 0.5;
/// A horizontal gap wider than this fraction of the font size is a space.
const WORD_GAP: f32 = 0.25;

struct Selected<'a> {
    text: &'a str,
    rect: PageRect,
    baseline: f32,
    font_size: f32,
}

/// Text of every glyph whose centre lies inside `region`, as lines ordered
/// top to bottom and left to right. Returns an empty string when nothing
/// matches.
pub fn text_in_region(runs: &[TextRun], region: &PageRect) -> String {
    let mut selected: Vec<Selected<'_>> = runs
        .iter()
        .flat_map(|run| {
            run.glyphs.iter().map(move |glyph| Selected {
                text: glyph.text.as_str(),
                rect: glyph.rect,
                baseline: run.baseline,
                font_size: run.font_size.max(1.0),
            })
        })
        .filter(|glyph| region.contains(glyph.rect.center()))
        .collect();

    if selected.is_empty() {
        return String::new();
    }

    selected.sort_by(|a, b| a.baseline.total_cmp(&b.baseline));

    let mut lines: Vec<Vec<Selected<'_>>> = Vec::new();
    for glyph in selected {
        match lines.last_mut() {
            Some(line)
                if (glyph.baseline - line[0].baseline).abs()
                    <= LINE_TOLERANCE * glyph.font_size.max(line[0].font_size) =>
            {
                line.push(glyph);
            }
            _ => lines.push(vec![glyph]),
        }
    }

    let text = lines
        .iter_mut()
        .map(|line| {
            line.sort_by(|a, b| a.rect.x0.total_cmp(&b.rect.x0));
            join_line(line)
        })
        .collect::<Vec<_>>()
        .join("\n");

    text.trim().to_string()
}

fn join_line(line: &[Selected<'_>]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Selected<'_>> = None;
    for glyph in line {
        if let Some(prev) = previous {
            let gap = glyph.rect.x0 - prev.rect.x1;
            let spaced = out.ends_with(char::is_whitespace) || glyph.text.starts_with(char::is_whitespace);
            if !spaced && gap > WORD_GAP * glyph.font_size {
                out.push(' ');
            }
        }
        out.push_str(glyph.text);
        previous = Some(glyph);
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfwerk_core::Glyph;

    /// A run of 5pt-wide glyphs starting at `x` on baseline `y`.
    fn run(text: &str, x: f32, y: f32) -> TextRun {
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, ch)| Glyph {
                text: ch.to_string(),
                rect: PageRect::from_origin_size(x + 5.0 * i as f32, y - 8.0, 5.0, 10.0),
            })
            .collect();
        TextRun {
            glyphs,
            font_size: 10.0,
            baseline: y,
        }
    }

    #[test]
    fn only_glyphs_centred_inside_are_read() {
        let runs = vec![run("abcdef", 0.0, 100.0)];
        // Centres are at 2.5, 7.5, 12.5 ...; the region ends at 14.
        let region = PageRect::from_origin_size(0.0, 90.0, 14.0, 20.0);
        assert_eq!(text_in_region(&runs, &region), "abc");
    }

    #[test]
    fn lines_are_ordered_top_to_bottom() {
        // Content order is bottom line first.
        let runs = vec![run("second", 0.0, 130.0), run("first", 0.0, 100.0)];
        let region = PageRect::from_origin_size(0.0, 0.0, 500.0, 500.0);
        assert_eq!(text_in_region(&runs, &region), "first\nsecond");
    }

    #[test]
    fn separate_runs_on_one_baseline_get_a_space() {
        let runs = vec![run("world", 60.0, 100.0), run("hello", 0.0, 100.5)];
        let region = PageRect::from_origin_size(0.0, 0.0, 500.0, 500.0);
        assert_eq!(text_in_region(&runs, &region), "hello world");
    }

    #[test]
    fn empty_region_yields_empty_text() {
        let runs = vec![run("abc", 0.0, 100.0)];
        let region = PageRect::from_origin_size(300.0, 300.0, 10.0, 10.0);
        assert!(text_in_region(&runs, &region).is_empty());
    }
}
