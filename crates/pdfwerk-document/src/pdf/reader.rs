// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents with `lopdf` and recover each
// page's layout: where images are painted and where text is shown.

use std::path::{Path, PathBuf};

use lopdf::{Document, ObjectId};
use pdfwerk_core::error::PdfwerkError;
use pdfwerk_core::{ImagePlacement, PageLayout, PageRect, PageSize};
use tracing::{debug, info, instrument};

use super::content::interpret_page;
use super::objects::media_box;
use super::region;

/// Read-only view of a PDF document.
///
/// Page indices are 0-based throughout.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Page object ids in page order.
    pages: Vec<ObjectId>,
    /// Source path, if opened from a file.
    source_path: Option<PathBuf>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfwerkError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PdfwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        let mut reader = Self::from_document(document);
        reader.source_path = Some(path_ref.to_path_buf());
        debug!(pages = reader.page_count(), "PDF loaded");
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PdfwerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            PdfwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        let reader = Self::from_document(document);
        debug!(pages = reader.page_count(), "PDF loaded from bytes");
        Ok(reader)
    }

    fn from_document(document: Document) -> Self {
        // `get_pages` is keyed by 1-based page number, already in order.
        let pages = document.get_pages().into_values().collect();
        Self {
            document,
            pages,
            source_path: None,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Size of a page's MediaBox in points.
    pub fn page_size(&self, index: usize) -> Result<PageSize, PdfwerkError> {
        let page_id = self.page_id(index)?;
        let (x0, y0, x1, y1) = media_box(&self.document, page_id);
        Ok(PageSize {
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    // -- Layout ---------------------------------------------------------------

    /// Images and text runs of a page, in paint order.
    #[instrument(skip(self))]
    pub fn page_layout(&self, index: usize) -> Result<PageLayout, PdfwerkError> {
        let page_id = self.page_id(index)?;
        let size = self.page_size(index)?;
        let content = interpret_page(&self.document, index, page_id)?;
        Ok(PageLayout {
            size,
            images: content.images,
            text_runs: content.text_runs,
        })
    }

    /// Every image painted on a page, in paint order.
    pub fn image_placements(&self, index: usize) -> Result<Vec<ImagePlacement>, PdfwerkError> {
        Ok(self.page_layout(index)?.images)
    }

    /// Text whose glyphs lie inside `rect`, as lines in reading order.
    pub fn text_in_region(&self, index: usize, rect: &PageRect) -> Result<String, PdfwerkError> {
        let layout = self.page_layout(index)?;
        Ok(region::text_in_region(&layout.text_runs, rect))
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, PdfwerkError> {
        self.pages
            .get(index)
            .copied()
            .ok_or(PdfwerkError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{FixtureImage, FixturePage, build_pdf, image_and_text_pdf};

    #[test]
    fn counts_pages_and_sizes() {
        let reader = PdfReader::from_bytes(&image_and_text_pdf()).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.page_size(1).unwrap(), PageSize::default());
        assert!(reader.source_path().is_none());
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let reader = PdfReader::from_bytes(&image_and_text_pdf()).unwrap();
        let err = reader.page_layout(2).unwrap_err();
        assert!(matches!(err, PdfwerkError::PageOutOfRange { index: 2, count: 2 }));
    }

    #[test]
    fn layout_has_images_and_text() {
        let reader = PdfReader::from_bytes(&image_and_text_pdf()).unwrap();
        let layout = reader.page_layout(0).unwrap();

        assert_eq!(layout.images.len(), 1);
        assert_eq!(layout.images[0].page, 0);
        assert_eq!(layout.images[0].rect, PageRect::from_origin_size(100.0, 342.0, 200.0, 150.0));
        assert_eq!(layout.text_runs.len(), 1);
        assert_eq!(layout.text_runs[0].text(), "Hello world");

        assert!(reader.image_placements(1).unwrap().is_empty());
    }

    #[test]
    fn region_text_is_clipped() {
        let reader = PdfReader::from_bytes(&image_and_text_pdf()).unwrap();
        // Helvetica without /Widths falls back to 6pt per glyph at 12pt.
        let region = PageRect::from_origin_size(95.0, 520.0, 34.0, 40.0);
        assert_eq!(reader.text_in_region(0, &region).unwrap(), "Hello");

        let nowhere = PageRect::from_origin_size(400.0, 10.0, 50.0, 50.0);
        assert!(reader.text_in_region(0, &nowhere).unwrap().is_empty());
    }

    #[test]
    fn open_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_pdf(&[FixturePage::default()])).unwrap();

        let reader = PdfReader::open(&path).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert_eq!(reader.source_path(), Some(path.as_path()));
        assert!(reader.page_layout(0).unwrap().text_runs.is_empty());
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let err = PdfReader::from_bytes(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, PdfwerkError::PdfError(_)));
    }

    #[test]
    fn media_box_is_inherited_from_the_page_tree() {
        let reader = PdfReader::from_bytes(&build_pdf(&[FixturePage {
            content: "q 100 0 0 50 20 300 cm /Im0 Do Q".into(),
            images: vec![FixtureImage::rgb("Im0")],
            media_box: Some([0, 0, 300, 400]),
            inherit_media_box: true,
            ..FixturePage::default()
        }]))
        .unwrap();

        assert_eq!(reader.page_size(0).unwrap(), PageSize { width: 300.0, height: 400.0 });
        let placements = reader.image_placements(0).unwrap();
        assert_eq!(placements[0].rect, PageRect::from_origin_size(20.0, 50.0, 100.0, 50.0));
    }

    #[test]
    fn page_space_starts_at_the_media_box_corner() {
        let reader = PdfReader::from_bytes(&build_pdf(&[FixturePage {
            content: "q 200 0 0 150 200 500 cm /Im0 Do Q BT /F1 12 Tf 200 450 Td (Offset) Tj ET".into(),
            images: vec![FixtureImage::rgb("Im0")],
            media_box: Some([100, 200, 712, 992]),
            ..FixturePage::default()
        }]))
        .unwrap();

        assert_eq!(reader.page_size(0).unwrap(), PageSize::default());
        let layout = reader.page_layout(0).unwrap();
        assert_eq!(layout.images[0].rect, PageRect::from_origin_size(100.0, 342.0, 200.0, 150.0));
        assert_eq!(layout.text_runs[0].baseline, 542.0);
        assert_eq!(layout.text_runs[0].glyphs[0].rect.x0, 100.0);
    }
}
