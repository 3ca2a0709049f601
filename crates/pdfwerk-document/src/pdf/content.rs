// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream interpreter — walks a page's operators, tracking the
// graphics state stack and the text state, and records where images are
// painted and where every glyph lands. Form XObjects are followed.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfwerk_core::{Glyph, ImagePlacement, PagePoint, PageRect, TextRun};
use tracing::{debug, warn};

use super::fonts::{FontDecoder, font_dict};
use super::objects::{dict_entry, media_box, name, number, page_content, page_resources, resolve, stream_bytes};
use pdfwerk_core::error::{PdfwerkError, Result};

/// Nesting limit for Form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Glyph box extent below and above the baseline, in text space units.
const GLYPH_DESCENT: f32 = -0.2;
const GLYPH_ASCENT: f32 = 0.8;

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Six numeric operands (as for `cm` and `Tm`).
    pub fn from_operands(operands: &[Object]) -> Option<Matrix> {
        let values: Vec<f32> = operands.iter().map(number).collect::<Option<_>>()?;
        match values.as_slice() {
            [a, b, c, d, e, f] => Some(Matrix::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }
}

/// Maps PDF user space (bottom-left origin) into page space (top-left origin).
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageSpace {
    left: f32,
    top: f32,
}

impl PageSpace {
    pub fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }

    pub fn to_page(&self, x: f32, y: f32) -> PagePoint {
        PagePoint::new(x - self.left, self.top - y)
    }

    /// Bounding box, in page space, of `corners` mapped through `matrix`.
    fn bounds(&self, matrix: &Matrix, corners: &[(f32, f32)]) -> PageRect {
        let mut points = corners.iter().map(|(x, y)| {
            let (ux, uy) = matrix.apply(*x, *y);
            self.to_page(ux, uy)
        });
        let first = points.next().unwrap_or_default();
        points.fold(PageRect::from_corners(first, first), |rect, p| {
            rect.union(&PageRect::from_corners(p, p))
        })
    }
}

/// Images and text found on one page.
#[derive(Debug, Default)]
pub(crate) struct PageContent {
    pub images: Vec<ImagePlacement>,
    pub text_runs: Vec<TextRun>,
}

/// Interpret the content streams of `page_id` (0-based index `page`).
pub(crate) fn interpret_page(doc: &Document, page: usize, page_id: ObjectId) -> Result<PageContent> {
    let (left, _, _, top) = media_box(doc, page_id);
    let data = page_content(doc, page_id)?;

    let content = match decode_operations(&data) {
        Ok(content) => content,
        Err(err) => {
            warn!(page, %err, "Content stream could not be parsed; page treated as empty");
            return Ok(PageContent::default());
        }
    };

    let mut interpreter = Interpreter {
        doc,
        page,
        space: PageSpace::new(left, top),
        fonts: HashMap::new(),
        visited_forms: Vec::new(),
        output: PageContent::default(),
    };
    interpreter.run(
        &content.operations,
        page_resources(doc, page_id),
        GraphicsState::new(Matrix::IDENTITY),
        0,
    );

    debug!(
        page,
        operations = content.operations.len(),
        images = interpreter.output.images.len(),
        runs = interpreter.output.text_runs.len(),
        "Page interpreted"
    );
    Ok(interpreter.output)
}

/// Operator that stands in for a collapsed inline image.
const INLINE_IMAGE_MARKER: &str = "PwInlineImage";

/// Decode a content stream, first collapsing inline images to marker
/// operators.
fn decode_operations(data: &[u8]) -> Result<Content> {
    Content::decode(&collapse_inline_images(data))
        .map_err(|err| PdfwerkError::PdfError(format!("invalid content stream: {}", err)))
}

fn is_pdf_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\0')
}

fn is_pdf_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Whether the two-letter operator `word` starts at `pos` as a whole token.
fn operator_at(data: &[u8], pos: usize, word: &[u8; 2]) -> bool {
    data[pos..].starts_with(word)
        && (pos == 0 || is_pdf_whitespace(data[pos - 1]))
        && data
            .get(pos + 2)
            .is_none_or(|next| is_pdf_whitespace(*next) || is_pdf_delimiter(*next))
}

/// End of a literal string opening at `start`, past its closing parenthesis.
fn literal_string_end(data: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut pos = start;
    while pos < data.len() {
        match data[pos] {
            b'\\' => pos += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return pos + 1;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    data.len()
}

/// End of the inline image whose dictionary starts at `from`, just past its
/// `EI`. The data after `ID` is opaque, so `EI` only counts when whitespace
/// precedes it and whitespace, a delimiter or the end of the stream follows.
fn inline_image_end(data: &[u8], from: usize) -> Option<usize> {
    let id = (from..data.len().saturating_sub(1)).find(|&pos| {
        &data[pos..pos + 2] == b"ID"
            && pos > 0
            && is_pdf_whitespace(data[pos - 1])
            && data.get(pos + 2).is_none_or(|next| is_pdf_whitespace(*next))
    })?;
    (id + 2..data.len()).find_map(|pos| {
        let ends = is_pdf_whitespace(data[pos])
            && data[pos + 1..].starts_with(b"EI")
            && data
                .get(pos + 3)
                .is_none_or(|next| is_pdf_whitespace(*next) || is_pdf_delimiter(*next));
        ends.then_some(pos + 3)
    })
}

/// Replace every `BI … ID <data> EI` with [`INLINE_IMAGE_MARKER`], an
/// operator without operands that `lopdf` can parse. An unterminated inline
/// image swallows the rest of the stream.
pub(crate) fn collapse_inline_images(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut pos = 0;
    while pos < data.len() {
        match data[pos] {
            b'(' => {
                let end = literal_string_end(data, pos);
                out.extend_from_slice(&data[pos..end]);
                pos = end;
            }
            b'%' => {
                let end = data[pos..]
                    .iter()
                    .position(|b| matches!(b, b'\n' | b'\r'))
                    .map_or(data.len(), |offset| pos + offset);
                out.extend_from_slice(&data[pos..end]);
                pos = end;
            }
            b'B' if operator_at(data, pos, b"BI") => {
                out.extend_from_slice(INLINE_IMAGE_MARKER.as_bytes());
                match inline_image_end(data, pos + 2) {
                    Some(end) => pos = end,
                    None => {
                        debug!(offset = pos, "Unterminated inline image");
                        pos = data.len();
                    }
                }
            }
            byte => {
                out.push(byte);
                pos += 1;
            }
        }
    }
    out
}

/// Graphics state entries this interpreter cares about.
#[derive(Clone)]
struct GraphicsState {
    ctm: Matrix,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    font: Option<Rc<FontDecoder>>,
    font_size: f32,
}

impl GraphicsState {
    fn new(ctm: Matrix) -> Self {
        Self {
            ctm,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            font: None,
            font_size: 0.0,
        }
    }
}

/// Text matrix and text line matrix, live only inside `BT … ET`.
struct TextCursor {
    matrix: Matrix,
    line: Matrix,
}

impl TextCursor {
    fn reset(&mut self) {
        self.matrix = Matrix::IDENTITY;
        self.line = Matrix::IDENTITY;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line = Matrix::translate(tx, ty).multiply(&self.line);
        self.matrix = self.line;
    }

    fn set(&mut self, matrix: Matrix) {
        self.matrix = matrix;
        self.line = matrix;
    }

    fn advance(&mut self, tx: f32) {
        self.matrix = Matrix::translate(tx, 0.0).multiply(&self.matrix);
    }
}

struct Interpreter<'a> {
    doc: &'a Document,
    page: usize,
    space: PageSpace,
    fonts: HashMap<ObjectId, Rc<FontDecoder>>,
    visited_forms: Vec<ObjectId>,
    output: PageContent,
}

impl<'a> Interpreter<'a> {
    fn run(
        &mut self,
        operations: &[Operation],
        resources: Option<&'a Dictionary>,
        mut state: GraphicsState,
        depth: usize,
    ) {
        let mut saved: Vec<GraphicsState> = Vec::new();
        let mut cursor = TextCursor {
            matrix: Matrix::IDENTITY,
            line: Matrix::IDENTITY,
        };

        for op in operations {
            let operands = op.operands.as_slice();
            let operand = |index: usize| operands.get(index).and_then(number);

            match op.operator.as_str() {
                "q" => saved.push(state.clone()),
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        state = previous;
                    }
                }
                "cm" => {
                    if let Some(matrix) = Matrix::from_operands(operands) {
                        state.ctm = matrix.multiply(&state.ctm);
                    }
                }
                "BT" => cursor.reset(),
                "Tf" => {
                    let font_name = operands.first().and_then(name);
                    state.font = match (resources, font_name) {
                        (Some(resources), Some(font_name)) => self.font(resources, font_name),
                        _ => None,
                    };
                    state.font_size = operand(1).unwrap_or(0.0);
                }
                "Tc" => state.char_spacing = operand(0).unwrap_or(0.0),
                "Tw" => state.word_spacing = operand(0).unwrap_or(0.0),
                "Tz" => state.horizontal_scale = operand(0).unwrap_or(100.0) / 100.0,
                "TL" => state.leading = operand(0).unwrap_or(0.0),
                "Ts" => state.rise = operand(0).unwrap_or(0.0),
                "Td" => {
                    if let (Some(tx), Some(ty)) = (operand(0), operand(1)) {
                        cursor.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (operand(0), operand(1)) {
                        state.leading = -ty;
                        cursor.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(matrix) = Matrix::from_operands(operands) {
                        cursor.set(matrix);
                    }
                }
                "T*" => cursor.move_line(0.0, -state.leading),
                "Tj" => self.show(&state, &mut cursor, operands.first().into_iter()),
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show(&state, &mut cursor, items.iter());
                    }
                }
                "'" => {
                    cursor.move_line(0.0, -state.leading);
                    self.show(&state, &mut cursor, operands.first().into_iter());
                }
                "\"" => {
                    state.word_spacing = operand(0).unwrap_or(state.word_spacing);
                    state.char_spacing = operand(1).unwrap_or(state.char_spacing);
                    cursor.move_line(0.0, -state.leading);
                    self.show(&state, &mut cursor, operands.get(2).into_iter());
                }
                "Do" => {
                    if let (Some(resources), Some(xobject)) = (resources, operands.first().and_then(name)) {
                        self.paint_xobject(resources, xobject, &state, depth);
                    }
                }
                INLINE_IMAGE_MARKER => self.record_image(None, &state.ctm),
                _ => {}
            }
        }
    }

    /// Decoder for the font named `font_name`, cached per font object.
    fn font(&mut self, resources: &'a Dictionary, font_name: &[u8]) -> Option<Rc<FontDecoder>> {
        let doc = self.doc;
        let fonts = dict_entry(doc, resources, b"Font")?;
        let font_id = fonts.get(font_name).ok().and_then(|obj| obj.as_reference().ok());

        if let Some(cached) = font_id.and_then(|id| self.fonts.get(&id)) {
            return Some(Rc::clone(cached));
        }

        let decoder = Rc::new(FontDecoder::from_dict(doc, font_dict(doc, resources, font_name)?));
        if let Some(id) = font_id {
            self.fonts.insert(id, Rc::clone(&decoder));
        }
        Some(decoder)
    }

    /// Show strings (and `TJ` position adjustments) as a single text run.
    fn show<'o>(
        &mut self,
        state: &GraphicsState,
        cursor: &mut TextCursor,
        items: impl Iterator<Item = &'o Object>,
    ) {
        // Text shown without a selected font cannot be decoded.
        let Some(font) = state.font.as_ref() else {
            return;
        };
        let size = state.font_size;
        let scale = state.horizontal_scale;

        let mut run = TextRun {
            glyphs: Vec::new(),
            font_size: 0.0,
            baseline: 0.0,
        };

        for item in items {
            match item {
                Object::String(bytes, _) => {
                    for glyph in font.decode(bytes) {
                        let advance = glyph.width / 1000.0;
                        let render = Matrix::new(size * scale, 0.0, 0.0, size, 0.0, state.rise)
                            .multiply(&cursor.matrix)
                            .multiply(&state.ctm);

                        if run.glyphs.is_empty() {
                            let (ox, oy) = render.apply(0.0, 0.0);
                            let (ux, uy) = render.apply(0.0, 1.0);
                            run.font_size = ((ux - ox).powi(2) + (uy - oy).powi(2)).sqrt();
                            run.baseline = self.space.to_page(ox, oy).y;
                        }

                        if !glyph.text.is_empty() {
                            let rect = self.space.bounds(
                                &render,
                                &[
                                    (0.0, GLYPH_DESCENT),
                                    (advance, GLYPH_DESCENT),
                                    (0.0, GLYPH_ASCENT),
                                    (advance, GLYPH_ASCENT),
                                ],
                            );
                            run.glyphs.push(Glyph {
                                text: glyph.text,
                                rect,
                            });
                        }

                        let spacing = state.char_spacing
                            + if glyph.is_word_space { state.word_spacing } else { 0.0 };
                        cursor.advance((advance * size + spacing) * scale);
                    }
                }
                other => {
                    if let Some(adjustment) = number(other) {
                        cursor.advance(-adjustment / 1000.0 * size * scale);
                    }
                }
            }
        }

        if !run.glyphs.is_empty() {
            self.output.text_runs.push(run);
        }
    }

    fn paint_xobject(
        &mut self,
        resources: &'a Dictionary,
        xobject: &[u8],
        state: &GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(entry) = dict_entry(doc, resources, b"XObject").and_then(|x| x.get(xobject).ok()) else {
            debug!(name = %String::from_utf8_lossy(xobject), "XObject not found in resources");
            return;
        };
        let Object::Stream(stream) = resolve(doc, entry) else {
            return;
        };

        match stream.dict.get(b"Subtype").ok().and_then(name) {
            Some(b"Image") => {
                self.record_image(Some(String::from_utf8_lossy(xobject).into_owned()), &state.ctm);
            }
            Some(b"Form") => {
                if depth >= MAX_FORM_DEPTH {
                    warn!(depth, "Form XObject nesting too deep; skipped");
                    return;
                }
                let form_id = entry.as_reference().ok();
                if let Some(id) = form_id {
                    if self.visited_forms.contains(&id) {
                        warn!(?id, "Form XObject cycle; skipped");
                        return;
                    }
                    self.visited_forms.push(id);
                }

                let matrix = match stream.dict.get(b"Matrix").map(|m| resolve(doc, m)) {
                    Ok(Object::Array(items)) => Matrix::from_operands(items),
                    _ => None,
                }
                .unwrap_or(Matrix::IDENTITY);
                let form_resources = dict_entry(doc, &stream.dict, b"Resources").or(Some(resources));

                // A form inherits the graphics state in force at `Do`.
                let mut inherited = state.clone();
                inherited.ctm = matrix.multiply(&state.ctm);

                match stream_bytes(stream).and_then(|bytes| decode_operations(&bytes)) {
                    Ok(content) => self.run(&content.operations, form_resources, inherited, depth + 1),
                    Err(err) => warn!(%err, "Form XObject skipped"),
                }

                if form_id.is_some() {
                    self.visited_forms.pop();
                }
            }
            _ => {}
        }
    }

    /// An image occupies the unit square of its CTM.
    fn record_image(&mut self, name: Option<String>, ctm: &Matrix) {
        let rect = self
            .space
            .bounds(ctm, &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        self.output.images.push(ImagePlacement {
            page: self.page,
            rect,
            name,
        });
    }
}
