//! Content stream interpreter
//!
//! Tracks just enough graphics and text state to place every shown glyph on
//! the page. Painting operators other than text are ignored.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object};
use tracing::{debug, warn};

use super::font::{FontInfo, Glyph};
use crate::error::{Error, Result};
use crate::pdf_document::{as_number, stream_data, MediaBox, PdfDocument};
use crate::types::{BoundingBox, Matrix, TextRun};

/// Nesting limit for form XObjects drawing other forms
const MAX_FORM_DEPTH: usize = 8;

/// `TJ` adjustments below this (in 1/1000 em) end the current word
const WORD_BREAK_ADJUSTMENT: f64 = -200.0;

/// Largest pen jump, as a fraction of the glyph height, that still continues
/// the open word across show operators and text objects
const WORD_JOIN_TOLERANCE: f64 = 0.2;

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Rc<FontInfo>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            text: TextState::default(),
        }
    }
}

enum ShowItem<'o> {
    Text(&'o [u8]),
    Adjust(f64),
}

/// Glyphs of one word, bounded in user space. `pen` is where the last glyph's
/// baseline ended; the word stays open across show operators while the next
/// glyph starts there.
#[derive(Default)]
struct WordBuilder {
    text: String,
    bounds: Option<(f64, f64, f64, f64)>,
    pen: Option<(f64, f64)>,
}

impl WordBuilder {
    fn push(&mut self, text: &str, (x0, y0, x1, y1): (f64, f64, f64, f64), pen: (f64, f64)) {
        self.text.push_str(text);
        self.bounds = Some(match self.bounds {
            Some((a0, b0, a1, b1)) => (a0.min(x0), b0.min(y0), a1.max(x1), b1.max(y1)),
            None => (x0, y0, x1, y1),
        });
        self.pen = Some(pen);
    }

    /// Whether a glyph whose baseline starts at `origin` continues the word
    fn continues(&self, origin: (f64, f64), tolerance: f64) -> bool {
        self.pen
            .map_or(true, |(x, y)| (origin.0 - x).hypot(origin.1 - y) <= tolerance)
    }

    /// Emits the word as a top-down run and resets the builder
    fn finish(&mut self, media: &MediaBox, runs: &mut Vec<TextRun>) {
        self.pen = None;
        let text = std::mem::take(&mut self.text);
        if let Some((x0, y0, x1, y1)) = self.bounds.take() {
            if !text.is_empty() {
                runs.push(TextRun {
                    text,
                    bbox: BoundingBox::new(x0 - media.x0, media.y1 - y1, x1 - x0, y1 - y0),
                });
            }
        }
    }
}

pub(crate) struct ContentInterpreter<'a> {
    doc: &'a PdfDocument,
    media: MediaBox,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    fallback_font: Rc<FontInfo>,
    word: WordBuilder,
    runs: Vec<TextRun>,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(doc: &'a PdfDocument, media: MediaBox) -> Self {
        Self {
            doc,
            media,
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            fallback_font: Rc::new(FontInfo::fallback()),
            word: WordBuilder::default(),
            runs: Vec::new(),
        }
    }

    /// Interprets a page's decoded content and returns its runs in stream order
    pub fn run(mut self, content: &[u8], resources: Option<&'a Dictionary>) -> Result<Vec<TextRun>> {
        self.execute(content, resources, 0)?;
        self.word.finish(&self.media, &mut self.runs);
        Ok(self.runs)
    }

    fn execute(&mut self, data: &[u8], resources: Option<&'a Dictionary>, depth: usize) -> Result<()> {
        let content = Content::decode(data).map_err(|e| Error::Parse(format!("Content stream: {}", e)))?;
        let mut fonts: HashMap<Vec<u8>, Rc<FontInfo>> = HashMap::new();
        for operation in &content.operations {
            self.apply(operation, resources, &mut fonts, depth);
        }
        Ok(())
    }

    fn apply(
        &mut self,
        operation: &Operation,
        resources: Option<&'a Dictionary>,
        fonts: &mut HashMap<Vec<u8>, Rc<FontInfo>>,
        depth: usize,
    ) {
        let operands = &operation.operands;
        let num = |i: usize| operands.get(i).and_then(as_number).unwrap_or(0.0);

        match operation.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                let m = Matrix::new(num(0), num(1), num(2), num(3), num(4), num(5));
                self.state.ctm = m.multiply(&self.state.ctm);
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                let font = operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(|name| self.font(name, resources, fonts));
                self.state.text.font = font;
                self.state.text.size = num(1);
            }
            "Tc" => self.state.text.char_spacing = num(0),
            "Tw" => self.state.text.word_spacing = num(0),
            "Tz" => self.state.text.horizontal_scaling = num(0) / 100.0,
            "TL" => self.state.text.leading = num(0),
            "Ts" => self.state.text.rise = num(0),
            "Td" => self.move_line(num(0), num(1)),
            "TD" => {
                self.state.text.leading = -num(1);
                self.move_line(num(0), num(1));
            }
            "Tm" => {
                self.line_matrix = Matrix::new(num(0), num(1), num(2), num(3), num(4), num(5));
                self.text_matrix = self.line_matrix;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "\"" => {
                self.state.text.word_spacing = num(0);
                self.state.text.char_spacing = num(1);
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let items: Vec<ShowItem> = items
                        .iter()
                        .filter_map(|item| match item {
                            Object::String(bytes, _) => Some(ShowItem::Text(bytes)),
                            other => as_number(other).map(ShowItem::Adjust),
                        })
                        .collect();
                    self.show(&items);
                }
            }
            "Do" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.draw_form(name, resources, depth);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translate(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn font(
        &self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        fonts: &mut HashMap<Vec<u8>, Rc<FontInfo>>,
    ) -> Rc<FontInfo> {
        if let Some(font) = fonts.get(name) {
            return Rc::clone(font);
        }

        let doc = self.doc;
        let font = resources
            .and_then(|res| doc.resolve_dict(res, b"Font"))
            .and_then(|dict| doc.resolve_dict(dict, name))
            .map(|dict| Rc::new(FontInfo::from_dict(doc, dict)))
            .unwrap_or_else(|| {
                debug!("Font /{} not in resources, using fallback metrics", String::from_utf8_lossy(name));
                Rc::clone(&self.fallback_font)
            });
        fonts.insert(name.to_vec(), Rc::clone(&font));
        font
    }

    fn show(&mut self, items: &[ShowItem]) {
        let font = self
            .state
            .text
            .font
            .clone()
            .unwrap_or_else(|| Rc::clone(&self.fallback_font));

        for item in items {
            match item {
                ShowItem::Adjust(n) => {
                    let text = &self.state.text;
                    let tx = -n / 1000.0 * text.size * text.horizontal_scaling;
                    self.text_matrix = Matrix::translate(tx, 0.0).multiply(&self.text_matrix);
                    if *n < WORD_BREAK_ADJUSTMENT {
                        self.word.finish(&self.media, &mut self.runs);
                    }
                }
                ShowItem::Text(bytes) => {
                    for glyph in font.decode(bytes) {
                        self.show_glyph(&glyph);
                    }
                }
            }
        }
    }

    fn show_glyph(&mut self, glyph: &Glyph) {
        let text = &self.state.text;
        let advance = glyph.width / 1000.0;
        let render = Matrix::new(text.size * text.horizontal_scaling, 0.0, 0.0, text.size, 0.0, text.rise)
            .multiply(&self.text_matrix)
            .multiply(&self.state.ctm);
        let origin = render.transform(0.0, 0.0);
        let end = render.transform(advance, 0.0);

        if glyph.text.chars().all(char::is_whitespace) && !glyph.text.is_empty() {
            self.word.finish(&self.media, &mut self.runs);
        } else if glyph.text.is_empty() {
            if self.word.pen.is_some() {
                self.word.pen = Some(end);
            }
        } else {
            let (top_x, top_y) = render.transform(0.0, 1.0);
            let height = (top_x - origin.0).hypot(top_y - origin.1);
            if !self.word.continues(origin, height * WORD_JOIN_TOLERANCE) {
                self.word.finish(&self.media, &mut self.runs);
            }

            let corners = [
                render.transform(0.0, 0.0),
                render.transform(advance, 0.0),
                render.transform(0.0, 1.0),
                render.transform(advance, 1.0),
            ];
            let bounds = corners.iter().fold(
                (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
                |(x0, y0, x1, y1), (x, y)| (x0.min(*x), y0.min(*y), x1.max(*x), y1.max(*y)),
            );
            self.word.push(&glyph.text, bounds, end);
        }

        let mut tx = advance * text.size + text.char_spacing;
        if glyph.is_word_space {
            tx += text.word_spacing;
        }
        tx *= text.horizontal_scaling;
        self.text_matrix = Matrix::translate(tx, 0.0).multiply(&self.text_matrix);
    }

    fn draw_form(&mut self, name: &[u8], resources: Option<&'a Dictionary>, depth: usize) {
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|res| doc.resolve_dict(res, b"XObject"))
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|o| doc.resolve(o).ok())
            .and_then(|o| match o {
                Object::Stream(stream) => Some(stream),
                _ => None,
            })
        else {
            return;
        };

        if !matches!(stream.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Form")) {
            return;
        }
        if depth >= MAX_FORM_DEPTH {
            warn!("Form XObject nesting exceeds {}, skipping /{}", MAX_FORM_DEPTH, String::from_utf8_lossy(name));
            return;
        }

        let data = match stream_data(stream) {
            Ok(data) => data,
            Err(e) => {
                warn!("Skipping form /{}: {}", String::from_utf8_lossy(name), e);
                return;
            }
        };

        let matrix = match stream.dict.get(b"Matrix") {
            Ok(Object::Array(values)) if values.len() == 6 => {
                let v: Vec<f64> = values.iter().map(|o| as_number(o).unwrap_or(0.0)).collect();
                Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5])
            }
            _ => Matrix::IDENTITY,
        };
        let form_resources = doc.resolve_dict(&stream.dict, b"Resources").or(resources);

        self.stack.push(self.state.clone());
        self.state.ctm = matrix.multiply(&self.state.ctm);
        let saved_text = (self.text_matrix, self.line_matrix);
        if let Err(e) = self.execute(&data, form_resources, depth + 1) {
            warn!("Form /{} not interpreted: {}", String::from_utf8_lossy(name), e);
        }
        (self.text_matrix, self.line_matrix) = saved_text;
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn empty_document() -> PdfDocument {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => vec![], "Count" => 0 }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        PdfDocument::from_bytes(&bytes).unwrap()
    }

    const LETTER: MediaBox = MediaBox {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "{} != {}", actual, expected);
    }

    #[test]
    fn test_words_split_on_space() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"BT /F1 10 Tf 100 700 Td (Hi there) Tj ET", None)
            .unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hi");
        assert_close(runs[0].bbox.left, 100.0);
        assert_close(runs[0].bbox.top, 82.0);
        assert_close(runs[0].bbox.width, 10.0);
        assert_close(runs[0].bbox.height, 10.0);

        assert_eq!(runs[1].text, "there");
        assert_close(runs[1].bbox.left, 115.0);
        assert_close(runs[1].bbox.width, 25.0);
    }

    #[test]
    fn test_ctm_scales_glyph_boxes() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"2 0 0 2 0 0 cm BT /F1 10 Tf 10 10 Td (A) Tj ET", None)
            .unwrap();

        assert_eq!(runs.len(), 1);
        assert_close(runs[0].bbox.left, 20.0);
        assert_close(runs[0].bbox.top, 752.0);
        assert_close(runs[0].bbox.width, 10.0);
        assert_close(runs[0].bbox.height, 20.0);
    }

    #[test]
    fn test_restore_drops_transform() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"q 3 0 0 3 0 0 cm Q BT /F1 10 Tf 10 10 Td (A) Tj ET", None)
            .unwrap();
        assert_close(runs[0].bbox.left, 10.0);
        assert_close(runs[0].bbox.height, 10.0);
    }

    #[test]
    fn test_tj_kerning_and_word_break() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"BT /F1 10 Tf 0 0 Td [(A) -100 (B) -500 (C)] TJ ET", None)
            .unwrap();

        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["AB", "C"]);
        // A at 0..5, kern moves 1, B at 6..11
        assert_close(runs[0].bbox.width, 11.0);
        // B ends at 11, break moves 5
        assert_close(runs[1].bbox.left, 16.0);
    }

    #[test]
    fn test_word_continues_across_show_operators() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"BT /F1 10 Tf 100 700 Td (Hel) Tj 15 0 Td (lo) Tj ET", None)
            .unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello");
        assert_close(runs[0].bbox.left, 100.0);
        assert_close(runs[0].bbox.width, 25.0);
    }

    #[test]
    fn test_word_continues_across_text_objects() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"BT /F1 10 Tf 100 700 Td (Sec) Tj ET BT /F1 10 Tf 115 700 Td (ret) Tj ET", None)
            .unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Secret");
        assert_close(runs[0].bbox.width, 30.0);
    }

    #[test]
    fn test_word_breaks_on_gap_and_baseline() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"BT /F1 10 Tf 100 700 Td (AB) Tj 14 0 Td (CD) Tj 10 -12 Td (EF) Tj ET", None)
            .unwrap();

        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["AB", "CD", "EF"]);
        assert_close(runs[1].bbox.left, 114.0);
        assert_close(runs[2].bbox.left, 124.0);
        assert_close(runs[2].bbox.top - runs[1].bbox.top, 12.0);
    }

    #[test]
    fn test_next_line_uses_leading() {
        let doc = empty_document();
        let runs = ContentInterpreter::new(&doc, LETTER)
            .run(b"BT /F1 10 Tf 12 TL 50 100 Td (A) Tj T* (B) Tj ET", None)
            .unwrap();
        assert_eq!(runs.len(), 2);
        assert_close(runs[1].bbox.left, 50.0);
        assert_close(runs[1].bbox.top - runs[0].bbox.top, 12.0);
    }
}
