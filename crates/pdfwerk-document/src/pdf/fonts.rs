// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font decoding — map string bytes to glyph codes, Unicode text, and advance
// widths. Supports `/ToUnicode` CMaps, two-byte composite (Type0) fonts,
// `/Widths` and `/W` width tables, with a WinAnsi fallback for simple fonts.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::objects::{dict_entry, name, number, resolve, stream_bytes};

/// Width used when a font declares none, in 1/1000 text space units.
const FALLBACK_WIDTH: f32 = 500.0;

/// Highest code a two-byte font can show.
const MAX_CODE: u32 = 0xFFFF;

/// One decoded glyph.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DecodedGlyph {
    pub text: String,
    /// Advance width in 1/1000 text space units.
    pub width: f32,
    /// Single-byte code 32, the only code word spacing applies to.
    pub is_word_space: bool,
}

/// Decoder for one font resource.
#[derive(Debug, Clone, Default)]
pub(crate) struct FontDecoder {
    two_byte: bool,
    to_unicode: HashMap<u32, String>,
    widths: HashMap<u32, f32>,
    default_width: f32,
}

impl FontDecoder {
    /// Build a decoder from a font dictionary.
    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let subtype = font.get(b"Subtype").ok().and_then(name).unwrap_or_default();
        let two_byte = subtype == b"Type0";

        let to_unicode = match font.get(b"ToUnicode").map(|obj| resolve(doc, obj)) {
            Ok(Object::Stream(stream)) => stream_bytes(stream)
                .map(|bytes| parse_to_unicode(&bytes))
                .unwrap_or_default(),
            _ => HashMap::new(),
        };

        let (widths, default_width) = if two_byte {
            cid_widths(doc, font)
        } else {
            (simple_widths(doc, font), FALLBACK_WIDTH)
        };

        debug!(
            two_byte,
            mapped = to_unicode.len(),
            widths = widths.len(),
            "Font decoder built"
        );

        Self {
            two_byte,
            to_unicode,
            widths,
            default_width,
        }
    }

    /// Decode the bytes of a string operand into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                    DecodedGlyph {
                        text: self.to_unicode.get(&code).cloned().unwrap_or_default(),
                        width: self.width(code),
                        is_word_space: false,
                    }
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|byte| {
                    let code = u32::from(*byte);
                    let text = match self.to_unicode.get(&code) {
                        Some(mapped) => mapped.clone(),
                        None => win_ansi_char(*byte).map(String::from).unwrap_or_default(),
                    };
                    DecodedGlyph {
                        text,
                        width: self.width(code),
                        is_word_space: *byte == b' ',
                    }
                })
                .collect()
        }
    }

    fn width(&self, code: u32) -> f32 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }
}

/// `/FirstChar` + `/Widths` of a simple font.
fn simple_widths(doc: &Document, font: &Dictionary) -> HashMap<u32, f32> {
    let first = font
        .get(b"FirstChar")
        .ok()
        .and_then(|obj| number(resolve(doc, obj)))
        .unwrap_or(0.0) as u32;

    match font.get(b"Widths").map(|obj| resolve(doc, obj)) {
        Ok(Object::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(offset, item)| {
                number(resolve(doc, item)).map(|w| (first + offset as u32, w))
            })
            .collect(),
        _ => HashMap::new(),
    }
}

/// `/W` + `/DW` of the descendant CIDFont of a Type0 font.
fn cid_widths(doc: &Document, font: &Dictionary) -> (HashMap<u32, f32>, f32) {
    let descendant = match font.get(b"DescendantFonts").map(|obj| resolve(doc, obj)) {
        Ok(Object::Array(items)) => items.first().map(|first| resolve(doc, first)),
        _ => None,
    };
    let Some(Object::Dictionary(cid_font)) = descendant else {
        return (HashMap::new(), 1000.0);
    };

    let default_width = cid_font
        .get(b"DW")
        .ok()
        .and_then(|obj| number(resolve(doc, obj)))
        .unwrap_or(1000.0);

    let mut widths = HashMap::new();
    if let Ok(Object::Array(entries)) = cid_font.get(b"W").map(|obj| resolve(doc, obj)) {
        let mut index = 0;
        while index < entries.len() {
            let Some(start) = number(resolve(doc, &entries[index])) else {
                break;
            };
            // Float-to-int casts saturate; negative starts become 0.
            let start = start as u32;
            match entries.get(index + 1).map(|obj| resolve(doc, obj)) {
                // c [w1 w2 ...]
                Some(Object::Array(run)) => {
                    let codes = (start..=MAX_CODE).zip(run);
                    for (code, w) in codes {
                        if let Some(w) = number(resolve(doc, w)) {
                            widths.insert(code, w);
                        }
                    }
                    index += 2;
                }
                // cfirst clast w
                Some(end) => {
                    let end = number(end);
                    let w = entries.get(index + 2).and_then(|obj| number(resolve(doc, obj)));
                    let (Some(end), Some(w)) = (end, w) else {
                        break;
                    };
                    for code in start..=(end as u32).min(MAX_CODE) {
                        widths.insert(code, w);
                    }
                    index += 3;
                }
                None => break,
            }
        }
    }

    (widths, default_width)
}

/// Font dictionary named `font_name` in a resources dictionary.
pub(crate) fn font_dict<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    font_name: &[u8],
) -> Option<&'a Dictionary> {
    let fonts = dict_entry(doc, resources, b"Font")?;
    dict_entry(doc, fonts, font_name)
}

// -- ToUnicode CMap parsing ---------------------------------------------------

#[derive(Debug, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        match data[pos] {
            // Dictionary delimiters carry nothing we need.
            b'<' if data.get(pos + 1) == Some(&b'<') => pos += 2,
            b'>' => pos += 1,
            b'<' => {
                let end = data[pos + 1..]
                    .iter()
                    .position(|b| *b == b'>')
                    .map(|offset| pos + 1 + offset)
                    .unwrap_or(data.len());
                let digits: Vec<u8> = data[pos + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                tokens.push(Token::Hex(hex_bytes(&digits)));
                pos = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                pos += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                pos += 1;
            }
            b'%' => {
                while pos < data.len() && data[pos] != b'\n' && data[pos] != b'\r' {
                    pos += 1;
                }
            }
            byte if byte.is_ascii_whitespace() => pos += 1,
            _ => {
                let start = pos;
                while pos < data.len()
                    && !data[pos].is_ascii_whitespace()
                    && !matches!(data[pos], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    pos += 1;
                }
                tokens.push(Token::Word(String::from_utf8_lossy(&data[start..pos]).into_owned()));
            }
        }
    }
    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let value = |d: u8| -> u8 {
        match d {
            b'0'..=b'9' => d - b'0',
            b'a'..=b'f' => d - b'a' + 10,
            _ => d - b'A' + 10,
        }
    };
    // An odd trailing digit is padded with 0.
    digits
        .chunks(2)
        .map(|pair| (value(pair[0]) << 4) | pair.get(1).map(|d| value(*d)).unwrap_or(0))
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| (u16::from(pair[0]) << 8) | pair.get(1).map(|b| u16::from(*b)).unwrap_or(0))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
pub(crate) fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let tokens = tokenize(data);
    let mut map = HashMap::new();
    let mut index = 0;

    while index < tokens.len() {
        match &tokens[index] {
            Token::Word(word) if word == "beginbfchar" => {
                index += 1;
                while index + 1 < tokens.len() {
                    match (&tokens[index], &tokens[index + 1]) {
                        (Token::Hex(src), Token::Hex(dst)) => {
                            map.insert(code_of(src), utf16_text(dst));
                            index += 2;
                        }
                        _ => break,
                    }
                }
            }
            Token::Word(word) if word == "beginbfrange" => {
                index += 1;
                while index + 2 < tokens.len() {
                    let (Token::Hex(lo), Token::Hex(hi)) = (&tokens[index], &tokens[index + 1]) else {
                        break;
                    };
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    match &tokens[index + 2] {
                        Token::Hex(dst) => {
                            let mut base = dst.clone();
                            for code in lo..=hi.min(lo.saturating_add(0xFFFF)) {
                                map.insert(code, utf16_text(&base));
                                increment_last(&mut base);
                            }
                            index += 3;
                        }
                        Token::ArrayStart => {
                            index += 3;
                            let mut code = Some(lo);
                            while let Some(Token::Hex(dst)) = tokens.get(index) {
                                if let Some(current) = code.filter(|c| *c <= hi) {
                                    map.insert(current, utf16_text(dst));
                                }
                                code = code.and_then(|c| c.checked_add(1));
                                index += 1;
                            }
                            if matches!(tokens.get(index), Some(Token::ArrayEnd)) {
                                index += 1;
                            }
                        }
                        _ => break,
                    }
                }
            }
            _ => index += 1,
        }
    }

    map
}

/// Increment the last UTF-16 code unit of a big-endian destination string.
fn increment_last(bytes: &mut [u8]) {
    for byte in bytes.iter_mut().rev() {
        let (next, overflow) = byte.overflowing_add(1);
        *byte = next;
        if !overflow {
            break;
        }
    }
}

/// WinAnsi (Windows-1252) mapping for simple fonts without a ToUnicode CMap.
fn win_ansi_char(byte: u8) -> Option<char> {
    let mapped = match byte {
        0x00..=0x1F => return None,
        0x80 => '\u{20AC}',
        0x85 => '\u{2026}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x99 => '\u{2122}',
        other => char::from(other),
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::objects::page_resources;
    use crate::test_fixtures::{FixturePage, build_pdf};
    use lopdf::dictionary;

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <0048>
endbfchar
2 beginbfrange
<0020> <0022> <0061>
<0030> <0031> [<0058> <0059>]
endbfrange
endcmap";

    #[test]
    fn bfchar_and_bfrange_entries_are_mapped() {
        let map = parse_to_unicode(CMAP);
        assert_eq!(map.get(&0x0003).map(String::as_str), Some(" "));
        assert_eq!(map.get(&0x0011).map(String::as_str), Some("H"));
        assert_eq!(map.get(&0x0020).map(String::as_str), Some("a"));
        assert_eq!(map.get(&0x0022).map(String::as_str), Some("c"));
        assert_eq!(map.get(&0x0031).map(String::as_str), Some("Y"));
        assert!(!map.contains_key(&0x0023));
    }

    #[test]
    fn two_byte_fonts_decode_pairs() {
        let decoder = FontDecoder {
            two_byte: true,
            to_unicode: parse_to_unicode(CMAP),
            widths: HashMap::from([(0x0011, 722.0)]),
            default_width: 1000.0,
        };
        let glyphs = decoder.decode(&[0x00, 0x11, 0x00, 0x03]);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text, "H");
        assert_eq!(glyphs[0].width, 722.0);
        assert_eq!(glyphs[1].width, 1000.0);
        assert!(!glyphs[1].is_word_space);
    }

    #[test]
    fn type0_font_is_read_from_the_document() {
        let pdf = build_pdf(&[FixturePage::default()]);
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let resources = page_resources(&doc, page_id).unwrap();

        let decoder = FontDecoder::from_dict(&doc, font_dict(&doc, resources, b"F2").unwrap());
        let glyphs = decoder.decode(&[0x00, 0x01, 0x00, 0x02, 0x00, 0x04, 0x00, 0x09]);
        let text: Vec<&str> = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, ["H", "i", "B", ""]);
        let widths: Vec<f32> = glyphs.iter().map(|g| g.width).collect();
        assert_eq!(widths, [600.0, 400.0, 700.0, 1000.0]);
    }

    #[test]
    fn oversized_width_ranges_stop_at_the_two_byte_limit() {
        let mut doc = Document::with_version("1.5");
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "W" => vec![
                0.into(),
                Object::Integer(4_000_000_000),
                500.into(),
                Object::Integer(70_000),
                Object::Array(vec![300.into()]),
            ],
        });
        let font = dictionary! {
            "Subtype" => "Type0",
            "DescendantFonts" => vec![Object::Reference(descendant)],
        };

        let (widths, default_width) = cid_widths(&doc, &font);
        assert_eq!(widths.len(), 0x1_0000);
        assert_eq!(widths.get(&0xFFFF), Some(&500.0));
        assert_eq!(default_width, 1000.0);
    }

    #[test]
    fn bfrange_arrays_at_the_top_of_the_code_space_do_not_overflow() {
        let map = parse_to_unicode(
            b"1 beginbfrange\n<FFFFFFFF> <FFFFFFFF> [<0041> <0042>]\nendbfrange",
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&u32::MAX).map(String::as_str), Some("A"));
    }

    #[test]
    fn simple_fonts_fall_back_to_win_ansi() {
        let decoder = FontDecoder {
            default_width: FALLBACK_WIDTH,
            ..FontDecoder::default()
        };
        let glyphs = decoder.decode(b"A \x93");
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "A \u{201C}");
        assert!(glyphs[1].is_word_space);
    }
}
