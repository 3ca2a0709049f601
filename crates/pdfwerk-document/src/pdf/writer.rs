// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — apply scheduled image replacements to a fresh copy of the
// source document and serialise the result with `lopdf`.
//
// Each replacement paints an opaque white rectangle over the old image and
// draws the new image on top. The page's existing content is wrapped in
// `q … Q` first so any graphics state it leaves behind cannot skew the
// overlay.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfwerk_core::error::PdfwerkError;
use pdfwerk_core::{ImageModification, PageRect};
use tracing::{debug, info, instrument, warn};

use super::edits::ModificationLedger;
use super::objects::{dict_entry, media_box, page_resources, resolve};
use crate::image::ImageProcessor;

/// Prefix for the resource names of inserted images.
const IMAGE_NAME_PREFIX: &str = "PwImg";

/// Writes image replacements into existing PDF documents.
#[derive(Debug, Clone, Copy)]
pub struct PdfWriter {
    /// Fit replacements proportionally inside their target instead of
    /// stretching them to fill it.
    keep_aspect_ratio: bool,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PdfWriter {
    pub fn new(keep_aspect_ratio: bool) -> Self {
        Self { keep_aspect_ratio }
    }

    /// Apply every entry of `ledger` to a copy of `source` and return the
    /// serialised document.
    ///
    /// Entries whose page no longer exists are logged and skipped. Failing to
    /// load a replacement image aborts the whole save.
    #[instrument(skip_all, fields(source_len = source.len(), edits = ledger.len()))]
    pub fn apply(&self, source: &[u8], ledger: &ModificationLedger) -> Result<Vec<u8>, PdfwerkError> {
        let mut doc = Document::load_mem(source)
            .map_err(|err| PdfwerkError::PdfError(format!("failed to reload source PDF: {}", err)))?;
        let pages = doc.get_pages();

        let mut by_page: BTreeMap<usize, Vec<&ImageModification>> = BTreeMap::new();
        for modification in ledger.iter() {
            by_page.entry(modification.page).or_default().push(modification);
        }

        let mut next_name = 0usize;
        let mut applied = 0usize;
        for (page, modifications) in by_page {
            let Some(&page_id) = u32::try_from(page + 1).ok().and_then(|number| pages.get(&number)) else {
                warn!(page, count = pages.len(), "Skipping edits for a page that does not exist");
                continue;
            };
            applied += self.apply_page(&mut doc, page_id, &modifications, &mut next_name)?;
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|err| PdfwerkError::PdfError(format!("failed to serialise PDF: {}", err)))?;

        info!(applied, output_bytes = output.len(), "Image replacements written");
        Ok(output)
    }

    /// Apply `ledger` to `source` and write the result to `out_path`.
    #[instrument(skip(self, source, ledger, out_path), fields(path = %out_path.as_ref().display()))]
    pub fn save(
        &self,
        source: &[u8],
        ledger: &ModificationLedger,
        out_path: impl AsRef<Path>,
    ) -> Result<(), PdfwerkError> {
        let bytes = self.apply(source, ledger)?;
        std::fs::write(out_path.as_ref(), &bytes)?;
        Ok(())
    }

    /// Insert the replacements of one page. Returns how many were applied.
    fn apply_page(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
        modifications: &[&ImageModification],
        next_name: &mut usize,
    ) -> Result<usize, PdfwerkError> {
        let (llx, _, _, ury) = media_box(doc, page_id);

        // Snapshot everything that borrows `doc` before objects are added.
        let mut resources = page_resources(doc, page_id).cloned().unwrap_or_default();
        let mut xobjects = dict_entry(doc, &resources, b"XObject").cloned().unwrap_or_default();
        let mut contents = existing_contents(doc, page_id)?;

        let mut overlay = String::from("Q\n");
        for modification in modifications {
            let processor = ImageProcessor::open(&modification.image_path)?;
            let pdf_image = processor.to_pdf_image()?;

            let mut image = pdf_image.image;
            if let Some(mask) = pdf_image.soft_mask {
                let mask_id = doc.add_object(mask);
                image.dict.set("SMask", mask_id);
            }
            let image_id = doc.add_object(image);

            let name = loop {
                let candidate = format!("{}{}", IMAGE_NAME_PREFIX, *next_name);
                *next_name += 1;
                if !xobjects.has(candidate.as_bytes()) {
                    break candidate;
                }
            };
            xobjects.set(name.as_str(), image_id);

            let target = &modification.target;
            let placed = processor.fit_within(target, self.keep_aspect_ratio);
            overlay.push_str(&white_out(target, llx, ury));
            overlay.push_str(&draw_image(&name, &placed, llx, ury));

            debug!(
                image = %modification.image_path.display(),
                %target,
                %placed,
                resource = %name,
                "Replacement inserted"
            );
        }

        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay.into_bytes()));
        contents.insert(0, Object::Reference(open_id));
        contents.push(Object::Reference(overlay_id));

        resources.set("XObject", xobjects);

        let page = doc
            .get_object_mut(page_id)
            .and_then(|obj| obj.as_dict_mut())
            .map_err(|err| PdfwerkError::PdfError(format!("cannot update page {:?}: {}", page_id, err)))?;
        page.set("Contents", contents);
        page.set("Resources", resources);

        Ok(modifications.len())
    }
}

/// The page's `/Contents` as a flat list of stream references.
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, PdfwerkError> {
    let page = doc
        .get_object(page_id)
        .and_then(|obj| obj.as_dict())
        .map_err(|err| PdfwerkError::PdfError(format!("cannot read page {:?}: {}", page_id, err)))?;

    Ok(match page.get(b"Contents") {
        Ok(contents) => match resolve(doc, contents) {
            Object::Array(items) => items.clone(),
            _ => vec![contents.clone()],
        },
        Err(_) => Vec::new(),
    })
}

/// Opaque white fill over `rect` (page space) in PDF user space.
fn white_out(rect: &PageRect, llx: f32, ury: f32) -> String {
    format!(
        "q 1 1 1 rg 1 1 1 RG {:.3} {:.3} {:.3} {:.3} re f Q\n",
        llx + rect.x0,
        ury - rect.y1,
        rect.width(),
        rect.height()
    )
}

/// Paint the image XObject `name` so its unit square fills `rect`.
fn draw_image(name: &str, rect: &PageRect, llx: f32, ury: f32) -> String {
    format!(
        "q {:.3} 0 0 {:.3} {:.3} {:.3} cm /{} Do Q\n",
        rect.width(),
        rect.height(),
        llx + rect.x0,
        ury - rect.y1,
        name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::test_fixtures::{FixtureImage, FixturePage, build_pdf, image_and_text_pdf, write_rgb_image};
    use image::ImageFormat;

    fn close(a: &PageRect, b: &PageRect) -> bool {
        (a.x0 - b.x0).abs() < 0.01
            && (a.y0 - b.y0).abs() < 0.01
            && (a.x1 - b.x1).abs() < 0.01
            && (a.y1 - b.y1).abs() < 0.01
    }

    fn ledger_with(page: usize, target: PageRect, image: &Path) -> ModificationLedger {
        let mut ledger = ModificationLedger::new();
        ledger.schedule(ImageModification {
            page,
            target,
            image_path: image.to_path_buf(),
        });
        ledger
    }

    #[test]
    fn replacement_is_drawn_over_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_rgb_image(dir.path(), "square.png", 4, 4, ImageFormat::Png);
        let source = image_and_text_pdf();
        let target = PageRect::from_origin_size(100.0, 342.0, 200.0, 150.0);

        let output = PdfWriter::new(true)
            .apply(&source, &ledger_with(0, target, &png))
            .unwrap();
        let reader = PdfReader::from_bytes(&output).unwrap();

        assert_eq!(reader.page_count(), 2);
        let placements = reader.image_placements(0).unwrap();
        assert_eq!(placements.len(), 2);
        assert!(close(&placements[0].rect, &target));

        // A square fitted into 200x150 is 150x150, centred horizontally.
        let inserted = &placements[1];
        assert!(inserted.name.as_deref().unwrap().starts_with(IMAGE_NAME_PREFIX));
        assert!(close(&inserted.rect, &PageRect::from_origin_size(125.0, 342.0, 150.0, 150.0)));

        // Text on the page is untouched.
        let text = reader.text_in_region(0, &PageRect::from_origin_size(0.0, 500.0, 612.0, 100.0)).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn stretching_fills_the_whole_target() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_rgb_image(dir.path(), "square.png", 4, 4, ImageFormat::Png);
        let target = PageRect::from_origin_size(100.0, 342.0, 200.0, 150.0);

        let output = PdfWriter::new(false)
            .apply(&image_and_text_pdf(), &ledger_with(0, target, &png))
            .unwrap();
        let placements = PdfReader::from_bytes(&output).unwrap().image_placements(0).unwrap();
        assert!(close(&placements[1].rect, &target));
    }

    #[test]
    fn edits_for_missing_pages_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_rgb_image(dir.path(), "square.png", 4, 4, ImageFormat::Png);
        let target = PageRect::from_origin_size(0.0, 0.0, 10.0, 10.0);

        let output = PdfWriter::default()
            .apply(&image_and_text_pdf(), &ledger_with(7, target, &png))
            .unwrap();
        let reader = PdfReader::from_bytes(&output).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.image_placements(0).unwrap().len(), 1);
    }

    #[test]
    fn inherited_resources_stay_usable() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_rgb_image(dir.path(), "square.png", 4, 4, ImageFormat::Png);
        let source = build_pdf(&[FixturePage {
            content: "q 100 0 0 100 50 50 cm /Im0 Do Q BT /F1 10 Tf 50 20 Td (Caption) Tj ET".into(),
            images: vec![FixtureImage::rgb("Im0")],
            inherit_resources: true,
            ..FixturePage::default()
        }]);
        let target = PageRect::from_origin_size(50.0, 642.0, 100.0, 100.0);

        let output = PdfWriter::default()
            .apply(&source, &ledger_with(0, target, &png))
            .unwrap();
        let reader = PdfReader::from_bytes(&output).unwrap();
        let layout = reader.page_layout(0).unwrap();

        assert_eq!(layout.images.len(), 2);
        assert_eq!(layout.images[0].name.as_deref(), Some("Im0"));
        assert_eq!(layout.text_runs.len(), 1);
        assert_eq!(layout.text_runs[0].text(), "Caption");
    }

    #[test]
    fn unreadable_replacement_aborts_the_save() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.png");
        std::fs::write(&bogus, b"not a png").unwrap();
        let target = PageRect::from_origin_size(100.0, 342.0, 200.0, 150.0);

        let err = PdfWriter::default()
            .apply(&image_and_text_pdf(), &ledger_with(0, target, &bogus))
            .unwrap_err();
        assert!(matches!(err, PdfwerkError::ImageError(_)));
    }

    #[test]
    fn save_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_rgb_image(dir.path(), "square.png", 4, 4, ImageFormat::Png);
        let out = dir.path().join("edited.pdf");
        let target = PageRect::from_origin_size(100.0, 342.0, 200.0, 150.0);

        PdfWriter::default()
            .save(&image_and_text_pdf(), &ledger_with(0, target, &png), &out)
            .unwrap();
        assert_eq!(PdfReader::open(&out).unwrap().page_count(), 2);
    }

    #[test]
    fn offset_media_box_places_the_replacement_on_its_target() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_rgb_image(dir.path(), "square.png", 4, 4, ImageFormat::Png);
        let source = build_pdf(&[FixturePage {
            content: "q 200 0 0 150 200 500 cm /Im0 Do Q".into(),
            images: vec![FixtureImage::rgb("Im0")],
            media_box: Some([100, 200, 712, 992]),
            ..FixturePage::default()
        }]);
        let target = PageRect::from_origin_size(100.0, 342.0, 200.0, 150.0);

        let output = PdfWriter::default()
            .apply(&source, &ledger_with(0, target, &png))
            .unwrap();
        let placements = PdfReader::from_bytes(&output).unwrap().image_placements(0).unwrap();

        assert_eq!(placements.len(), 2);
        assert!(close(&placements[0].rect, &target));
        assert!(close(&placements[1].rect, &PageRect::from_origin_size(125.0, 342.0, 150.0, 150.0)));
    }
}
