// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfwerk — Desktop PDF editor
//
// Entry point. Initialises logging and backend services, creates the editor
// session, and launches the Dioxus UI.

mod pages;
mod services;

use dioxus::prelude::*;

use pdfwerk_document::EditorSession;

use pages::editor::Editor;
use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("pdfwerk starting");

    dioxus::launch(app);
}

/// Root component.
fn app() -> Element {
    // Initialise backend services (config, speech worker)
    let svc = use_hook(AppServices::init);

    // Provide services and the editor session as context for all components
    use_context_provider(|| svc.clone());
    use_context_provider(|| {
        Signal::new(EditorSession::new(svc.config(), svc.speech_available()))
    });

    rsx! {
        document::Title { "PDF Editor" }
        Editor {}
    }
}
