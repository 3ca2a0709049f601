// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page canvas — the layout view of the page on screen: text runs and image
// boxes at their true positions, scheduled replacements previewed as real
// pixels, plus the selection and drag overlays.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dioxus::prelude::*;

use pdfwerk_core::{CanvasPoint, CanvasRect, EditMode};
use pdfwerk_document::image::fit_rect;
use pdfwerk_document::{EditorSession, ImageProcessor};

use crate::services::app_services::AppServices;

/// Encoded previews keyed by image path and display size. `None` marks an
/// image that could not be rendered.
pub type PreviewCache = Rc<RefCell<HashMap<(PathBuf, i32, i32), Option<String>>>>;

#[derive(Debug, Clone, PartialEq)]
struct TextSpan {
    style: String,
    text: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ImageBox {
    style: String,
    label: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ReplacementView {
    target_style: String,
    placed_style: String,
    uri: Option<String>,
}

/// Everything needed to draw the canvas, as ready-made CSS.
#[derive(Debug, Clone, PartialEq)]
struct CanvasModel {
    page_style: String,
    texts: Vec<TextSpan>,
    images: Vec<ImageBox>,
    replacements: Vec<ReplacementView>,
    selection_style: Option<String>,
    drag_style: Option<String>,
}

impl CanvasModel {
    fn build(session: &EditorSession, previews: &PreviewCache) -> Option<Self> {
        let layout = session.layout()?;
        let zoom = session.zoom();

        let texts = layout
            .text_runs
            .iter()
            .filter_map(|run| {
                let rect = run.rect()?.to_canvas(zoom);
                Some(TextSpan {
                    style: format!(
                        "position: absolute; left: {}px; top: {}px; font-size: {:.1}px; line-height: 1; white-space: pre; font-family: Helvetica, Arial, sans-serif;",
                        rect.x0,
                        rect.y0,
                        run.font_size * zoom
                    ),
                    text: run.text(),
                })
            })
            .collect();

        let images = layout
            .images
            .iter()
            .map(|image| ImageBox {
                style: format!(
                    "{} box-sizing: border-box; border: 1px dashed #888; background: rgba(120,120,120,0.15); font-size: 10px; color: #555; overflow: hidden;",
                    rect_style(&image.rect.to_canvas(zoom))
                ),
                label: image.name.clone().unwrap_or_else(|| "inline image".into()),
            })
            .collect();

        let keep_aspect = session.config().keep_aspect_ratio;
        let replacements = session
            .page_replacements()
            .map(|modification| {
                let target = modification.target.to_canvas(zoom);
                let placed = ImageProcessor::dimensions(&modification.image_path)
                    .map(|(w, h)| fit_rect(&modification.target, w, h, keep_aspect).to_canvas(zoom))
                    .unwrap_or(target);
                ReplacementView {
                    target_style: format!("{} background: white;", rect_style(&target)),
                    placed_style: rect_style(&placed),
                    uri: preview_uri(previews, &modification.image_path, &placed),
                }
            })
            .collect();

        let page_style = format!(
            "position: relative; width: {}px; height: {}px; background: white; box-shadow: 0 1px 4px rgba(0,0,0,0.3); margin: 16px auto; overflow: hidden; color: #111;",
            (layout.size.width * zoom) as i32,
            (layout.size.height * zoom) as i32
        );

        Some(Self {
            page_style,
            texts,
            images,
            replacements,
            selection_style: session.selection().map(|image| {
                format!(
                    "{} box-sizing: border-box; border: 3px solid blue;",
                    rect_style(&image.rect.to_canvas(zoom))
                )
            }),
            drag_style: session
                .draw_rect()
                .map(|rect| format!("{} box-sizing: border-box; border: 2px solid red;", rect_style(&rect))),
        })
    }
}

/// PNG data URI of `path` resized to `rect`, cached across renders.
fn preview_uri(previews: &PreviewCache, path: &Path, rect: &CanvasRect) -> Option<String> {
    let key = (path.to_path_buf(), rect.width(), rect.height());
    if let Some(cached) = previews.borrow().get(&key) {
        return cached.clone();
    }

    let width = rect.width().max(1) as u32;
    let height = rect.height().max(1) as u32;
    let uri = match ImageProcessor::open(path).and_then(|p| p.resize_exact(width, height).to_png_bytes()) {
        Ok(png) => Some(format!("data:image/png;base64,{}", STANDARD.encode(png))),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not render replacement preview");
            None
        }
    };
    previews.borrow_mut().insert(key, uri.clone());
    uri
}

fn rect_style(rect: &CanvasRect) -> String {
    format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px;",
        rect.x0,
        rect.y0,
        rect.width(),
        rect.height()
    )
}

#[component]
pub fn PageCanvas() -> Element {
    let mut session = use_context::<Signal<EditorSession>>();
    let svc = use_context::<AppServices>();
    let previews: PreviewCache = use_hook(|| Rc::new(RefCell::new(HashMap::new())));

    let model = CanvasModel::build(&session.read(), &previews);
    let Some(model) = model else {
        return rsx! {
            div { style: "padding: 48px; text-align: center; color: #888;",
                "Open a PDF to start editing."
            }
        };
    };
    let page_style = model.page_style;

    rsx! {
        div { style: "{page_style}",
            for TextSpan { style, text } in model.texts {
                span { style: "{style}", "{text}" }
            }

            for ImageBox { style, label } in model.images {
                div { style: "{style}", "{label}" }
            }

            for ReplacementView { target_style, placed_style, uri } in model.replacements {
                // The original image is hidden in the saved file; a preview
                // that failed to render leaves the white box.
                div { style: "{target_style}" }
                if let Some(uri) = uri {
                    img { style: "{placed_style}", src: "{uri}" }
                }
            }

            if let Some(style) = model.selection_style {
                div { style: "{style}" }
            }

            if let Some(style) = model.drag_style {
                div { style: "{style}" }
            }

            // Transparent overlay that receives all pointer input.
            div {
                style: "position: absolute; inset: 0; cursor: crosshair;",
                onmousedown: move |evt: MouseEvent| {
                    let point = canvas_point(&evt);
                    let mode = session.read().mode();
                    match mode {
                        EditMode::Select => {
                            session.write().select_at(point);
                        }
                        EditMode::DrawAndRead => {
                            session.write().begin_draw(point);
                        }
                    }
                },
                onmousemove: move |evt: MouseEvent| {
                    if session.read().draw_rect().is_some() {
                        session.write().update_draw(canvas_point(&evt));
                    }
                },
                onmouseup: move |evt: MouseEvent| {
                    let text = session.write().finish_draw(canvas_point(&evt));
                    if let Some(text) = text
                        && let Err(e) = svc.speak(text)
                    {
                        tracing::warn!(error = %e, "could not queue speech");
                        session.write().set_status("TTS not available");
                    }
                },
            }
        }
    }
}

fn canvas_point(evt: &MouseEvent) -> CanvasPoint {
    let point = evt.element_coordinates();
    CanvasPoint::new(point.x as f32, point.y as f32)
}
