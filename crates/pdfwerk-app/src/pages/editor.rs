// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor page — toolbar, mode bar, page canvas, and status line.

use std::path::PathBuf;

use dioxus::prelude::*;
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use pdfwerk_core::error::PdfwerkError;
use pdfwerk_core::human_errors::humanize_error;
use pdfwerk_core::{EditMode, Palette, Theme};
use pdfwerk_document::{EditorSession, REPLACEMENT_EXTENSIONS};

use super::canvas::PageCanvas;
use crate::services::app_services::AppServices;

#[component]
pub fn Editor() -> Element {
    let mut session = use_context::<Signal<EditorSession>>();
    let svc = use_context::<AppServices>();
    let saving = use_signal(|| false);

    let (palette, mode, page_label, status, speech_available) = {
        let s = session.read();
        (
            s.theme().palette(),
            s.mode(),
            s.page_label(),
            s.status().to_string(),
            s.speech_available(),
        )
    };
    let Palette {
        background,
        foreground,
        button_background,
        canvas_background,
    } = palette;
    let engine = svc.speech_engine().unwrap_or_else(|| "TTS not available".into());

    rsx! {
        div {
            style: "display: flex; flex-direction: column; height: 100vh; font-family: system-ui, -apple-system, sans-serif; background: {background}; color: {foreground};",

            // Toolbar
            div { style: "display: flex; gap: 6px; align-items: center; padding: 6px;",
                ToolButton {
                    label: "Open PDF",
                    background: button_background,
                    foreground: foreground,
                    disabled: false,
                    onclick: move |_| {
                        if let Some(path) = rfd::FileDialog::new()
                            .set_title("Open PDF")
                            .add_filter("PDF files", &["pdf"])
                            .pick_file()
                        {
                            let result = session.write().open(&path);
                            if let Err(e) = result {
                                show_dialog(MessageLevel::Error, "Open PDF", &format!("Failed to open: {e}"));
                            }
                        }
                    },
                }
                ToolButton {
                    label: "Prev",
                    background: button_background,
                    foreground: foreground,
                    disabled: false,
                    onclick: move |_| {
                        session.write().prev_page();
                    },
                }
                ToolButton {
                    label: "Next",
                    background: button_background,
                    foreground: foreground,
                    disabled: false,
                    onclick: move |_| {
                        session.write().next_page();
                    },
                }
                span { style: "margin: 0 8px;", "{page_label}" }
                div { style: "flex: 1;" }
                ToolButton {
                    label: "Light",
                    background: button_background,
                    foreground: foreground,
                    disabled: false,
                    onclick: {
                        let svc = svc.clone();
                        move |_| apply_theme(session, &svc, Theme::Light)
                    },
                }
                ToolButton {
                    label: "Dark",
                    background: button_background,
                    foreground: foreground,
                    disabled: false,
                    onclick: {
                        let svc = svc.clone();
                        move |_| apply_theme(session, &svc, Theme::Dark)
                    },
                }
            }

            // Mode bar
            div { style: "display: flex; gap: 6px; align-items: center; padding: 0 6px 6px 6px;",
                ModeButton {
                    mode: EditMode::Select,
                    active: mode == EditMode::Select,
                    disabled: false,
                    background: button_background,
                    foreground: foreground,
                }
                ModeButton {
                    mode: EditMode::DrawAndRead,
                    active: mode == EditMode::DrawAndRead,
                    disabled: !speech_available,
                    background: button_background,
                    foreground: foreground,
                }
                ToolButton {
                    label: "Replace Image",
                    background: button_background,
                    foreground: foreground,
                    disabled: false,
                    onclick: move |_| replace_image(session),
                }
                ToolButton {
                    label: "Save As…",
                    background: button_background,
                    foreground: foreground,
                    disabled: *saving.read(),
                    onclick: move |_| save_as(session, saving),
                }
                ToolButton {
                    label: "Clear Page Edits",
                    background: button_background,
                    foreground: foreground,
                    disabled: false,
                    onclick: move |_| {
                        session.write().clear_page_edits();
                    },
                }
                ToolButton {
                    label: "Stop Speaking",
                    background: button_background,
                    foreground: foreground,
                    disabled: !speech_available,
                    onclick: {
                        let svc = svc.clone();
                        move |_| {
                            svc.stop_speaking();
                            session.write().set_status("Speech stopped");
                        }
                    },
                }
            }

            // Canvas
            div { style: "flex: 1; overflow: auto; background: {canvas_background};",
                PageCanvas {}
            }

            // Status
            div { style: "display: flex; padding: 4px 6px; font-size: 13px;",
                span { style: "flex: 1;", "Status: {status}" }
                span { style: "opacity: 0.6;", "{engine}" }
            }
        }
    }
}

fn apply_theme(mut session: Signal<EditorSession>, svc: &AppServices, theme: Theme) {
    tracing::info!(theme = theme.name(), "theme changed");
    session.write().set_theme(theme);
    let mut config = svc.config();
    config.theme = theme;
    if let Err(e) = svc.save_config(&config) {
        tracing::warn!(error = %e, "could not persist theme");
    }
}

fn replace_image(mut session: Signal<EditorSession>) {
    let (mode, has_selection) = {
        let s = session.read();
        (s.mode(), s.selection().is_some())
    };
    if mode != EditMode::Select {
        show_dialog(MessageLevel::Warning, "Mode", "Switch to 'Select Image' mode to replace images.");
        return;
    }
    if !has_selection {
        show_dialog(
            MessageLevel::Warning,
            "No selection",
            "Click an image on the page to select it first.",
        );
        return;
    }

    let Some(path) = rfd::FileDialog::new()
        .set_title("Choose replacement image")
        .add_filter("Images", REPLACEMENT_EXTENSIONS)
        .pick_file()
    else {
        session.write().set_status("Image replacement cancelled");
        return;
    };

    let result = session.write().schedule_replacement(&path);
    if let Err(e) = result {
        report(&e);
    }
}

fn save_as(mut session: Signal<EditorSession>, mut saving: Signal<bool>) {
    let job = match session.read().prepare_save() {
        Ok(job) => job,
        Err(PdfwerkError::NoDocument) => {
            show_dialog(MessageLevel::Warning, "No PDF", "Open a PDF first");
            return;
        }
        Err(PdfwerkError::NothingToSave) => {
            show_dialog(MessageLevel::Info, "No changes", "There are no image replacements to save.");
            return;
        }
        Err(e) => {
            report(&e);
            return;
        }
    };

    let Some(out_path) = rfd::FileDialog::new()
        .set_title("Save modified PDF")
        .add_filter("PDF", &["pdf"])
        .set_file_name("edited.pdf")
        .save_file()
    else {
        return;
    };
    let out_path = with_pdf_extension(out_path);
    session.write().set_status("Saving PDF...");

    saving.set(true);
    spawn(async move {
        tracing::info!(path = %out_path.display(), edits = job.edit_count(), "saving PDF");
        let target = out_path.clone();
        let written = match tokio::task::spawn_blocking(move || job.run(&target)).await {
            Ok(result) => result,
            Err(e) => Err(PdfwerkError::PdfError(format!("save task failed: {e}"))),
        };

        let result = written.and_then(|()| session.write().finish_save(&out_path));
        match result {
            Ok(()) => show_dialog(
                MessageLevel::Info,
                "Saved",
                &format!("Modified PDF saved to:\n{}", out_path.display()),
            ),
            Err(e) => {
                tracing::error!(error = %e, "save failed");
                session.write().save_failed();
                show_dialog(MessageLevel::Error, "Save Error", &format!("Could not save PDF: {e}"));
            }
        }
        saving.set(false);
    });
}

/// Default to a `.pdf` extension when the user typed a bare name.
fn with_pdf_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("pdf")
    }
}

fn report(error: &PdfwerkError) {
    let human = humanize_error(error);
    let level = match human.severity {
        pdfwerk_core::human_errors::Severity::Failure => MessageLevel::Error,
        _ => MessageLevel::Warning,
    };
    show_dialog(level, human.title, &format!("{}\n\n{}", human.message, human.suggestion));
}

fn show_dialog(level: MessageLevel, title: &str, description: &str) {
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

#[component]
fn ModeButton(
    mode: EditMode,
    active: bool,
    disabled: bool,
    background: &'static str,
    foreground: &'static str,
) -> Element {
    let mut session = use_context::<Signal<EditorSession>>();
    let border = if active { "2px solid #007aff" } else { "1px solid #999" };
    let opacity = if disabled { "0.5" } else { "1" };
    let label = mode.label();
    rsx! {
        button {
            style: "padding: 6px 10px; border-radius: 6px; border: {border}; background: {background}; color: {foreground}; opacity: {opacity};",
            disabled: disabled,
            onclick: move |_| {
                // A refused switch has already set the status line.
                let _ = session.write().set_mode(mode);
            },
            "{label}"
        }
    }
}

#[component]
fn ToolButton(
    label: &'static str,
    background: &'static str,
    foreground: &'static str,
    disabled: bool,
    onclick: EventHandler<MouseEvent>,
) -> Element {
    let opacity = if disabled { "0.5" } else { "1" };
    rsx! {
        button {
            style: "padding: 6px 10px; border-radius: 6px; border: 1px solid #999; background: {background}; color: {foreground}; opacity: {opacity};",
            disabled: disabled,
            onclick: move |evt| onclick.call(evt),
            "{label}"
        }
    }
}
