// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small helpers for walking `lopdf` object graphs.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdfwerk_core::PageSize;
use pdfwerk_core::error::{PdfwerkError, Result};

/// Follow a reference (one level is all PDF allows for direct values).
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(&Object::Null),
        other => other,
    }
}

/// Resolve `key` in `dict` to a dictionary, following a reference if needed.
pub(crate) fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    let value = dict.get(key).ok()?;
    match resolve(doc, value) {
        Object::Dictionary(inner) => Some(inner),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Numeric value of an Integer or Real object.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

pub(crate) fn name(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// Stream payload with filters removed; unfiltered streams are returned as-is.
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream
            .decompressed_content()
            .map_err(|err| PdfwerkError::PdfError(format!("failed to decompress stream: {}", err)))
    } else {
        Ok(stream.content.clone())
    }
}

/// Look up `key` on a page, walking up the page tree through `/Parent`.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    // Page trees are shallow; the bound guards against /Parent cycles.
    for _ in 0..64 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// The page's MediaBox as `(llx, lly, urx, ury)`, normalised.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let values: Option<Vec<f32>> = match inherited(doc, page_id, b"MediaBox") {
        Some(Object::Array(items)) if items.len() == 4 => {
            items.iter().map(|item| number(resolve(doc, item))).collect()
        }
        _ => None,
    };
    match values.as_deref() {
        Some([x0, y0, x1, y1]) => (x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)),
        _ => {
            let size = PageSize::default();
            (0.0, 0.0, size.width, size.height)
        }
    }
}

/// The page's effective `/Resources` dictionary, if any.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    match inherited(doc, page_id, b"Resources")? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Concatenated, decoded content streams of a page.
pub(crate) fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page = doc
        .get_object(page_id)
        .and_then(|obj| obj.as_dict())
        .map_err(|err| PdfwerkError::PdfError(format!("cannot read page {:?}: {}", page_id, err)))?;

    let contents = match page.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };

    let parts: Vec<&Object> = match resolve(doc, contents) {
        Object::Array(items) => items.iter().collect(),
        _ => vec![contents],
    };

    let mut content = Vec::new();
    for part in parts {
        if let Object::Stream(stream) = resolve(doc, part) {
            content.extend_from_slice(&stream_bytes(stream)?);
            content.push(b'\n');
        }
    }
    Ok(content)
}
