// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor session — the state behind the editor window: the open document,
// the page on screen, the current selection, scheduled replacements, and the
// status line.

use std::path::{Path, PathBuf};

use pdfwerk_core::error::PdfwerkError;
use pdfwerk_core::{
    AppConfig, CanvasPoint, CanvasRect, EditMode, ImageModification, ImagePlacement, PageLayout,
    PageRect, Theme,
};
use tracing::{info, instrument, warn};

use crate::image::ImageProcessor;
use crate::pdf::region;
use crate::pdf::{ModificationLedger, PdfReader, PdfWriter, Scheduled};

/// A loaded document together with the bytes it was parsed from.
struct OpenDocument {
    reader: PdfReader,
    bytes: Vec<u8>,
    path: PathBuf,
}

impl OpenDocument {
    fn load(path: &Path) -> Result<Self, PdfwerkError> {
        let bytes = std::fs::read(path)?;
        let reader = PdfReader::from_bytes(&bytes)?;
        Ok(Self {
            reader,
            bytes,
            path: path.to_path_buf(),
        })
    }
}

/// Everything needed to write the edited document, detached from the
/// session so it can run off the UI thread.
#[derive(Debug, Clone)]
pub struct SaveJob {
    source: Vec<u8>,
    ledger: ModificationLedger,
    writer: PdfWriter,
}

impl SaveJob {
    /// Write the edited document to `out_path`.
    pub fn run(&self, out_path: &Path) -> Result<(), PdfwerkError> {
        self.writer.save(&self.source, &self.ledger, out_path)
    }

    pub fn edit_count(&self) -> usize {
        self.ledger.len()
    }
}

/// Editor state for one window.
pub struct EditorSession {
    config: AppConfig,
    document: Option<OpenDocument>,
    current_page: usize,
    /// Layout of `current_page`, refreshed on every page change.
    layout: Option<PageLayout>,
    ledger: ModificationLedger,
    selection: Option<ImagePlacement>,
    mode: EditMode,
    drag_start: Option<CanvasPoint>,
    drag_current: Option<CanvasPoint>,
    speech_available: bool,
    status: String,
}

impl EditorSession {
    pub fn new(config: AppConfig, speech_available: bool) -> Self {
        Self {
            config,
            document: None,
            current_page: 0,
            layout: None,
            ledger: ModificationLedger::new(),
            selection: None,
            mode: EditMode::Select,
            drag_start: None,
            drag_current: None,
            speech_available,
            status: String::from("Ready"),
        }
    }

    // -- Settings -------------------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.config.theme = theme;
    }

    /// Canvas pixels per PDF point.
    pub fn zoom(&self) -> f32 {
        self.config.effective_zoom()
    }

    pub fn speech_available(&self) -> bool {
        self.speech_available
    }

    // -- Document -------------------------------------------------------------

    /// Open `path`, replacing the current document.
    ///
    /// On failure the previous document stays open.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn open(&mut self, path: &Path) -> Result<(), PdfwerkError> {
        let document = match OpenDocument::load(path) {
            Ok(document) => document,
            Err(err) => {
                warn!(%err, "Failed to open PDF");
                self.set_status("Failed to open PDF");
                return Err(err);
            }
        };

        info!(pages = document.reader.page_count(), "Document opened");
        self.install(document);
        self.set_status(format!("Opened: {}", file_name(path)));
        Ok(())
    }

    fn install(&mut self, document: OpenDocument) {
        self.document = Some(document);
        self.current_page = 0;
        self.ledger.clear();
        self.clear_selection();
        self.clear_drag();
        self.refresh_layout();
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn document_path(&self) -> Option<&Path> {
        self.document.as_ref().map(|doc| doc.path.as_path())
    }

    pub fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, |doc| doc.reader.page_count())
    }

    /// 0-based index of the page on screen.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Layout of the page on screen, if a document is open.
    pub fn layout(&self) -> Option<&PageLayout> {
        self.layout.as_ref()
    }

    fn refresh_layout(&mut self) {
        let result = match &self.document {
            Some(doc) => doc.reader.page_layout(self.current_page),
            None => {
                self.layout = None;
                return;
            }
        };
        self.layout = match result {
            Ok(layout) => Some(layout),
            Err(err) => {
                warn!(page = self.current_page, %err, "Could not lay out page");
                self.set_status("Invalid page index");
                None
            }
        };
    }

    // -- Navigation -----------------------------------------------------------

    /// Move to the next page. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        if self.current_page + 1 >= self.page_count() {
            return false;
        }
        self.go_to(self.current_page + 1);
        true
    }

    /// Move to the previous page. Returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        if !self.has_document() || self.current_page == 0 {
            return false;
        }
        self.go_to(self.current_page - 1);
        true
    }

    fn go_to(&mut self, page: usize) {
        self.current_page = page;
        self.clear_selection();
        self.clear_drag();
        self.refresh_layout();
        if self.layout.is_some() {
            self.set_status(format!("Displayed page {}", page + 1));
        }
    }

    /// "Page: i/n", or "Page: 0/0" with no document.
    pub fn page_label(&self) -> String {
        match self.page_count() {
            0 => String::from("Page: 0/0"),
            count => format!("Page: {}/{}", self.current_page + 1, count),
        }
    }

    // -- Modes ----------------------------------------------------------------

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Switch interaction mode, dropping any selection or drag in progress.
    pub fn set_mode(&mut self, mode: EditMode) -> Result<(), PdfwerkError> {
        if mode == EditMode::DrawAndRead && !self.speech_available {
            self.set_status("TTS not available");
            return Err(PdfwerkError::SpeechUnavailable);
        }
        self.mode = mode;
        self.clear_selection();
        self.clear_drag();
        Ok(())
    }

    // -- Selection ------------------------------------------------------------

    /// Select the first image (in paint order) under a click.
    ///
    /// Image boxes are grown by the click tolerance, which is configured in
    /// canvas pixels and therefore shrinks in page space as zoom grows.
    pub fn select_at(&mut self, point: CanvasPoint) -> Option<&ImagePlacement> {
        if self.mode != EditMode::Select {
            return None;
        }
        if !self.has_document() {
            self.set_status("Open a PDF first");
            return None;
        }
        self.clear_selection();

        let zoom = self.zoom();
        let images = self.layout.as_ref().map(|layout| layout.images.as_slice()).unwrap_or_default();
        if images.is_empty() {
            self.set_status("No images detected on this page");
            return None;
        }

        let tolerance = self.config.click_tolerance_px / zoom;
        let target = point.to_page(zoom);
        let hit = images
            .iter()
            .find(|image| image.rect.expand(tolerance).contains(target))
            .cloned();

        match hit {
            Some(image) => {
                self.set_status(format!("Selected image at {}", image.rect));
                self.selection = Some(image);
            }
            None => self.set_status("No image at clicked location"),
        }
        self.selection.as_ref()
    }

    pub fn selection(&self) -> Option<&ImagePlacement> {
        self.selection.as_ref()
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    // -- Replacements ---------------------------------------------------------

    /// Schedule `image_path` to replace the selected image.
    ///
    /// The image header is read here so a bad file is reported before save.
    pub fn schedule_replacement(&mut self, image_path: &Path) -> Result<Scheduled, PdfwerkError> {
        if self.mode != EditMode::Select {
            return Err(PdfwerkError::WrongMode {
                required: EditMode::Select.label(),
            });
        }
        let target = self.selection.as_ref().ok_or(PdfwerkError::NoSelection)?.rect;

        let (width, height) = ImageProcessor::dimensions(image_path)?;
        info!(path = %image_path.display(), width, height, %target, "Replacement image accepted");

        let scheduled = self.ledger.schedule(ImageModification {
            page: self.current_page,
            target,
            image_path: image_path.to_path_buf(),
        });
        self.set_status(format!("Scheduled replacement: {}", file_name(image_path)));
        Ok(scheduled)
    }

    pub fn ledger(&self) -> &ModificationLedger {
        &self.ledger
    }

    /// Replacements scheduled on the page on screen.
    pub fn page_replacements(&self) -> impl Iterator<Item = &ImageModification> {
        self.ledger.for_page(self.current_page)
    }

    /// Drop every replacement on the page on screen.
    pub fn clear_page_edits(&mut self) -> usize {
        let removed = self.ledger.clear_page(self.current_page);
        self.set_status(format!(
            "Cleared {} edits on page {}",
            removed,
            self.current_page + 1
        ));
        removed
    }

    // -- Saving ---------------------------------------------------------------

    /// Snapshot the source and ledger for writing.
    pub fn prepare_save(&self) -> Result<SaveJob, PdfwerkError> {
        let document = self.document.as_ref().ok_or(PdfwerkError::NoDocument)?;
        if self.ledger.is_empty() {
            return Err(PdfwerkError::NothingToSave);
        }
        let job = SaveJob {
            source: document.bytes.clone(),
            ledger: self.ledger.clone(),
            writer: PdfWriter::new(self.config.keep_aspect_ratio),
        };
        Ok(job)
    }

    /// Reopen the file a [`SaveJob`] wrote, starting again at page one with
    /// no pending edits.
    #[instrument(skip(self), fields(path = %out_path.display()))]
    pub fn finish_save(&mut self, out_path: &Path) -> Result<(), PdfwerkError> {
        match OpenDocument::load(out_path) {
            Ok(document) => {
                self.install(document);
                self.set_status(format!("Saved to {}", file_name(out_path)));
                info!("Saved document reopened");
                Ok(())
            }
            Err(err) => {
                self.save_failed();
                Err(err)
            }
        }
    }

    /// Record that a save did not complete.
    pub fn save_failed(&mut self) {
        self.set_status("Save failed");
    }

    /// Write the edited document to `out_path` and reopen it.
    pub fn save_as(&mut self, out_path: &Path) -> Result<(), PdfwerkError> {
        let job = self.prepare_save()?;
        self.set_status("Saving PDF...");
        if let Err(err) = job.run(out_path) {
            warn!(%err, "Save failed");
            self.save_failed();
            return Err(err);
        }
        self.finish_save(out_path)
    }

    // -- Draw & Read ----------------------------------------------------------

    /// Start dragging a reading rectangle. Returns whether a drag started.
    pub fn begin_draw(&mut self, point: CanvasPoint) -> bool {
        if self.mode != EditMode::DrawAndRead {
            return false;
        }
        if !self.has_document() {
            self.set_status("Open a PDF first");
            return false;
        }
        if !self.speech_available {
            self.set_status("TTS not available");
            return false;
        }
        self.drag_start = Some(point);
        self.drag_current = Some(point);
        self.set_status("Drawing region to read");
        true
    }

    pub fn update_draw(&mut self, point: CanvasPoint) {
        if self.drag_start.is_some() {
            self.drag_current = Some(point);
        }
    }

    /// The rectangle being dragged, in canvas pixels.
    pub fn draw_rect(&self) -> Option<CanvasRect> {
        let (start, current) = (self.drag_start?, self.drag_current?);
        Some(CanvasRect {
            x0: start.x.min(current.x) as i32,
            y0: start.y.min(current.y) as i32,
            x1: start.x.max(current.x) as i32,
            y1: start.y.max(current.y) as i32,
        })
    }

    /// Finish the drag at `point` and return the text inside the rectangle.
    pub fn finish_draw(&mut self, point: CanvasPoint) -> Option<String> {
        let start = self.drag_start?;
        self.clear_drag();

        let zoom = self.zoom();
        let region = PageRect::from_corners(start.to_page(zoom), point.to_page(zoom));
        self.read_region(&region)
    }

    fn clear_drag(&mut self) {
        self.drag_start = None;
        self.drag_current = None;
    }

    /// Text inside `region` on the page on screen, or `None` when there is
    /// nothing to read.
    pub fn read_region(&mut self, region: &PageRect) -> Option<String> {
        let layout = self.layout.as_ref()?;
        let text = region::text_in_region(&layout.text_runs, region);
        if text.is_empty() {
            self.set_status("No text found in selection");
            return None;
        }
        self.set_status("Queuing text for speech");
        Some(text)
    }

    // -- Status ---------------------------------------------------------------

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
