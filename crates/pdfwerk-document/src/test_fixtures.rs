// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small PDFs and images built in memory for unit tests.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// A 2x2 RGB image XObject registered under `name`.
#[derive(Debug, Clone)]
pub struct FixtureImage {
    pub name: &'static str,
}

impl FixtureImage {
    pub fn rgb(name: &'static str) -> Self {
        Self { name }
    }
}

/// One page of a fixture document.
#[derive(Debug, Clone, Default)]
pub struct FixturePage {
    /// Raw content stream.
    pub content: String,
    pub images: Vec<FixtureImage>,
    /// Content of a Form XObject registered as `/Fm0` with
    /// `/Matrix [1 0 0 1 10 10]`.
    pub form: Option<String>,
    /// Put `/Resources` on the page tree root instead of the page.
    pub inherit_resources: bool,
    /// MediaBox other than US Letter at the origin.
    pub media_box: Option<[i64; 4]>,
    /// Put `/MediaBox` on the page tree root instead of the page.
    pub inherit_media_box: bool,
}

/// ToUnicode CMap of the `/F2` fixture font: codes 1 and 2 are "H" and "i",
/// codes 3 to 5 are "A" to "C".
const TYPE0_TO_UNICODE: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0001> <0048>
<0002> <0069>
endbfchar
1 beginbfrange
<0003> <0005> <0041>
endbfrange
endcmap
end end";

/// Add the `/F2` composite font: two-byte codes, widths 600 and 400 for
/// codes 1 and 2, 700 for codes 3 to 5, 1000 otherwise.
fn add_type0_font(doc: &mut Document) -> ObjectId {
    let to_unicode = doc.add_object(Stream::new(Dictionary::new(), TYPE0_TO_UNICODE.as_bytes().to_vec()));
    let descendant = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "FixtureSans",
        "DW" => 1000i64,
        "W" => vec![
            1.into(),
            Object::Array(vec![600.into(), 400.into()]),
            3.into(),
            5.into(),
            700.into(),
        ],
    });
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "FixtureSans",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(descendant)],
        "ToUnicode" => to_unicode,
    })
}

fn media_box_object(values: [i64; 4]) -> Object {
    Object::Array(values.iter().map(|v| Object::Integer(*v)).collect())
}

/// Build a PDF with US Letter pages, a Helvetica font registered as `/F1`
/// and a composite font registered as `/F2`.
pub fn build_pdf(pages: &[FixturePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let type0_id = add_type0_font(&mut doc);

    let mut kids = Vec::new();
    let mut inherited: Option<Dictionary> = None;
    let mut inherited_media_box: Option<Object> = None;

    for page in pages {
        let mut xobjects = Dictionary::new();
        for image in &page.images {
            let image_id = doc.add_object(Object::Stream(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2i64,
                    "Height" => 2i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8i64,
                },
                vec![255u8, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 0],
            )));
            xobjects.set(image.name, image_id);
        }
        if let Some(form) = &page.form {
            let form_id = doc.add_object(Object::Stream(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 1000.into(), 1000.into()],
                    "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 10.into(), 10.into()],
                },
                form.as_bytes().to_vec(),
            )));
            xobjects.set("Fm0", form_id);
        }

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id, "F2" => type0_id },
            "XObject" => xobjects,
        };

        let content_id = doc.add_object(Stream::new(Dictionary::new(), page.content.as_bytes().to_vec()));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        let media_box = media_box_object(page.media_box.unwrap_or([0, 0, 612, 792]));
        if page.inherit_media_box {
            inherited_media_box = Some(media_box);
        } else {
            page_dict.set("MediaBox", media_box);
        }
        if page.inherit_resources {
            inherited = Some(resources);
        } else {
            page_dict.set("Resources", resources);
        }
        kids.push(Object::from(doc.add_object(page_dict)));
    }

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages.len() as i64,
    };
    if let Some(resources) = inherited {
        pages_dict.set("Resources", resources);
    }
    if let Some(media_box) = inherited_media_box {
        pages_dict.set("MediaBox", media_box);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save fixture PDF");
    buf
}

/// One page whose content calls `/Fm0`, a chain of `levels` Form XObjects.
/// Each form calls the next; the innermost paints `/Im0` over its unit
/// square scaled to 10x10.
pub fn nested_forms_pdf(levels: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let image_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1i64,
            "Height" => 1i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8i64,
        },
        vec![0u8],
    )));

    // Built innermost first so each form can reference the next.
    let mut next: Option<ObjectId> = None;
    for _ in 0..levels {
        let mut xobjects = dictionary! { "Im0" => image_id };
        let content = match next {
            Some(inner) => {
                xobjects.set("Fm0", inner);
                "/Fm0 Do"
            }
            None => "q 10 0 0 10 0 0 cm /Im0 Do Q",
        };
        next = Some(doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                "Resources" => dictionary! { "XObject" => xobjects },
            },
            content.as_bytes().to_vec(),
        ))));
    }

    let mut xobjects = dictionary! { "Im0" => image_id };
    if let Some(outer) = next {
        xobjects.set("Fm0", outer);
    }
    let content_id = doc.add_object(Stream::new(Dictionary::new(), b"/Fm0 Do".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "XObject" => xobjects },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save fixture PDF");
    buf
}

/// A single page with one 200x150 image at (100, 300) in user space and a
/// line of text below it.
pub fn image_and_text_pdf() -> Vec<u8> {
    build_pdf(&[
        FixturePage {
            content: "q 200 0 0 150 100 300 cm /Im0 Do Q BT /F1 12 Tf 100 250 Td (Hello world) Tj ET"
                .into(),
            images: vec![FixtureImage::rgb("Im0")],
            ..FixturePage::default()
        },
        FixturePage {
            content: "BT /F1 12 Tf 72 700 Td (Second page) Tj ET".into(),
            ..FixturePage::default()
        },
    ])
}

/// Write an opaque RGB image of `width` x `height` to `dir/name`.
pub fn write_rgb_image(dir: &Path, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    let image = RgbImage::from_pixel(width, height, Rgb([20, 120, 220]));
    DynamicImage::ImageRgb8(image)
        .save_with_format(&path, format)
        .expect("write fixture image");
    path
}

/// Write a half-transparent RGBA PNG.
pub fn write_rgba_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 128]));
    DynamicImage::ImageRgba8(image)
        .save_with_format(&path, ImageFormat::Png)
        .expect("write fixture image");
    path
}
