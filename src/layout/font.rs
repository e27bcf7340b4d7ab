//! Font decoding for layout extraction
//!
//! Only what positioning needs: code length, advance widths and the text of
//! each code. Glyph outlines are never read.

use std::collections::HashMap;

use lopdf::{Dictionary, Object};
use tracing::debug;

use super::cmap::ToUnicodeMap;
use crate::pdf_document::{as_number, stream_data, PdfDocument};

/// Advance used when a font carries no width information, in 1/1000 em
const FALLBACK_WIDTH: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// One byte per code (Type1, TrueType, Type3)
    Simple,
    /// Type0 with a CID-keyed descendant
    Composite,
}

/// One decoded character code
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub text: String,
    /// Horizontal advance in 1/1000 em
    pub width: f64,
    /// Single-byte code 32, the only code word spacing applies to
    pub is_word_space: bool,
}

#[derive(Debug, Clone)]
pub struct FontInfo {
    kind: FontKind,
    code_len: usize,
    widths: HashMap<u32, f64>,
    default_width: f64,
    to_unicode: Option<ToUnicodeMap>,
}

impl FontInfo {
    /// Font used when `Tf` names a resource that does not exist
    pub fn fallback() -> Self {
        Self {
            kind: FontKind::Simple,
            code_len: 1,
            widths: HashMap::new(),
            default_width: FALLBACK_WIDTH,
            to_unicode: None,
        }
    }

    pub fn from_dict(doc: &PdfDocument, dict: &Dictionary) -> Self {
        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .and_then(|o| doc.resolve(o).ok())
            .and_then(|o| match o {
                Object::Stream(stream) => stream_data(stream).ok(),
                _ => None,
            })
            .map(|data| ToUnicodeMap::parse(&data))
            .filter(|cmap| !cmap.is_empty());

        let is_type0 = matches!(dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Type0"));
        if is_type0 {
            Self::composite(doc, dict, to_unicode)
        } else {
            Self::simple(doc, dict, to_unicode)
        }
    }

    fn simple(doc: &PdfDocument, dict: &Dictionary, to_unicode: Option<ToUnicodeMap>) -> Self {
        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| doc.resolve(o).ok())
            .and_then(as_number)
            .unwrap_or(0.0) as u32;

        let mut widths = HashMap::new();
        if let Some(Object::Array(items)) = dict.get(b"Widths").ok().and_then(|o| doc.resolve(o).ok()) {
            for (offset, item) in items.iter().enumerate() {
                if let Some(w) = doc.resolve(item).ok().and_then(as_number) {
                    widths.insert(first_char + offset as u32, w);
                }
            }
        }

        let default_width = doc
            .resolve_dict(dict, b"FontDescriptor")
            .and_then(|fd| fd.get(b"MissingWidth").ok())
            .and_then(as_number)
            .filter(|w| *w > 0.0)
            .unwrap_or(FALLBACK_WIDTH);

        Self {
            kind: FontKind::Simple,
            code_len: 1,
            widths,
            default_width,
            to_unicode,
        }
    }

    fn composite(doc: &PdfDocument, dict: &Dictionary, to_unicode: Option<ToUnicodeMap>) -> Self {
        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| doc.resolve(o).ok())
            .and_then(|o| o.as_array().ok())
            .and_then(|items| items.first())
            .and_then(|o| doc.resolve(o).ok())
            .and_then(|o| o.as_dict().ok());

        let mut widths = HashMap::new();
        let mut default_width = 1000.0;
        if let Some(cid_font) = descendant {
            if let Some(dw) = cid_font.get(b"DW").ok().and_then(as_number) {
                default_width = dw;
            }
            if let Some(Object::Array(w)) = cid_font.get(b"W").ok().and_then(|o| doc.resolve(o).ok()) {
                parse_cid_widths(doc, w, &mut widths);
            }
        }

        let code_len = to_unicode
            .as_ref()
            .and_then(ToUnicodeMap::code_len)
            .filter(|len| (1..=4).contains(len))
            .unwrap_or(2);

        Self {
            kind: FontKind::Composite,
            code_len,
            widths,
            default_width,
            to_unicode,
        }
    }

    pub fn kind(&self) -> FontKind {
        self.kind
    }

    pub fn width_of(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    /// Splits a shown string into glyphs
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        bytes
            .chunks(self.code_len)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                Glyph {
                    code,
                    text: self.text_of(code),
                    width: self.width_of(code),
                    is_word_space: self.code_len == 1 && code == 32,
                }
            })
            .collect()
    }

    fn text_of(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return text.to_string();
        }
        match self.kind {
            // Latin-1 approximates StandardEncoding/WinAnsi for printable ASCII
            FontKind::Simple => char::from_u32(code).map(String::from).unwrap_or_default(),
            // UCS-2 CMaps use the code point itself; Identity-H without a
            // ToUnicode stream has no recoverable text
            FontKind::Composite => char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_else(|| {
                    debug!("No text for CID {:#06x}", code);
                    String::new()
                }),
        }
    }
}

/// Reads a CIDFont `/W` array: `c [w1 w2 ...]` and `c_first c_last w` forms
fn parse_cid_widths(doc: &PdfDocument, items: &[Object], widths: &mut HashMap<u32, f64>) {
    let mut i = 0;
    while i < items.len() {
        let Some(first) = doc.resolve(&items[i]).ok().and_then(as_number) else {
            i += 1;
            continue;
        };
        let first = first as u32;
        match items.get(i + 1).and_then(|o| doc.resolve(o).ok()) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = as_number(w) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = as_number(last).unwrap_or(first as f64) as u32;
                let w = items.get(i + 2).and_then(as_number);
                if let Some(w) = w {
                    for code in first..=last.min(first.saturating_add(0xFFFF)) {
                        widths.insert(code, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
}
