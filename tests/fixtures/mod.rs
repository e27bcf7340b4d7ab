//! PDF documents built in memory for the integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use pdx_redact::pdf_document::{as_number, stream_data, PdfDocument};

/// One `BT ... Tj ET` block
#[derive(Debug, Clone)]
pub struct TextItem {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

pub fn item(text: &str, x: f64, y: f64, size: f64) -> TextItem {
    TextItem {
        text: text.to_string(),
        x,
        y,
        size,
    }
}

/// Builds documents with two fonts: `/F1`, a simple font where every
/// printable ASCII code is 500 units wide, and `/F2`, an Identity-H Type0
/// font with a ToUnicode map and 1000-unit glyphs. Text containing any
/// non-ASCII character is shown with `/F2`.
pub struct TestFixtures {
    width: f64,
    height: f64,
    pages: Vec<Vec<TextItem>>,
    filter: ContentFilter,
}

/// Encoding applied to page content streams
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentFilter {
    Flate,
    Lzw,
    None,
}

impl TestFixtures {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pages: Vec::new(),
            filter: ContentFilter::Flate,
        }
    }

    pub fn filter(mut self, filter: ContentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn page(mut self, items: Vec<TextItem>) -> Self {
        self.pages.push(items);
        self
    }

    /// Two 500×500 pages: "张三" on page 1 at (10, 470) size 20, which is the
    /// top-down box {10, 10, 40, 20}; "Contract" on page 2
    pub fn scenario() -> Vec<u8> {
        Self::new(500.0, 500.0)
            .page(vec![item("张三", 10.0, 470.0, 20.0)])
            .page(vec![item("Contract", 50.0, 400.0, 12.0)])
            .build()
    }

    pub fn build(&self) -> Vec<u8> {
        let cids = self.cid_table();
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let simple_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "FirstChar" => 32,
            "LastChar" => 126,
            "Widths" => (32..=126).map(|_| Object::Integer(500)).collect::<Vec<_>>(),
        });
        let to_unicode = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&cids).into_bytes()));
        let cid_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "SimSun",
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "DW" => 1000,
        });
        let type0_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "SimSun",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font)],
            "ToUnicode" => to_unicode,
        });
        let resources = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => simple_font,
                "F2" => type0_font,
            },
        });

        let mut kids = Vec::new();
        for items in &self.pages {
            let operations: Vec<Operation> = items.iter().flat_map(|item| show(item, &cids)).collect();
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(match self.filter {
                ContentFilter::Flate => Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&content)),
                ContentFilter::Lzw => Stream::new(dictionary! { "Filter" => "LZWDecode" }, lzw(&content)),
                ContentFilter::None => Stream::new(dictionary! {}, content),
            });
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), real(self.width), real(self.height)],
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn cid_table(&self) -> BTreeMap<char, u16> {
        let mut cids = BTreeMap::new();
        for item in self.pages.iter().flatten().filter(|i| !i.text.is_ascii()) {
            for c in item.text.chars() {
                let next = cids.len() as u16 + 1;
                cids.entry(c).or_insert(next);
            }
        }
        cids
    }
}

fn show(item: &TextItem, cids: &BTreeMap<char, u16>) -> Vec<Operation> {
    let (font, shown) = if item.text.is_ascii() {
        ("F1", Object::String(item.text.as_bytes().to_vec(), StringFormat::Literal))
    } else {
        let codes: Vec<u8> = item.text.chars().flat_map(|c| cids[&c].to_be_bytes()).collect();
        ("F2", Object::String(codes, StringFormat::Hexadecimal))
    };
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(item.size)]),
        Operation::new("Td", vec![real(item.x), real(item.y)]),
        Operation::new("Tj", vec![shown]),
        Operation::new("ET", vec![]),
    ]
}

fn to_unicode_cmap(cids: &BTreeMap<char, u16>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CMapName /Fixture-UCS def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", cids.len()));
    for (c, cid) in cids {
        let mut units = [0u16; 2];
        let hex: String = c.encode_utf16(&mut units).iter().map(|u| format!("{:04X}", u)).collect();
        cmap.push_str(&format!("<{:04X}> <{}>\n", cid, hex));
    }
    cmap.push_str("endbfchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

fn real(value: f64) -> Object {
    Object::Real((value as f32).into())
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn lzw(data: &[u8]) -> Vec<u8> {
    weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
        .encode(data)
        .unwrap()
}

pub fn write_pdf(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// `[x, y, w, h]` of every `re` operator in the last content stream of a page
pub fn overlay_rects(bytes: &[u8], page: u32) -> Vec<[f64; 4]> {
    let doc = PdfDocument::from_bytes(bytes).unwrap();
    let page_id = doc.page_id(page).unwrap();
    let contents = doc.get_dict(page_id).unwrap().get(b"Contents").unwrap();
    let last = match doc.resolve(contents).unwrap() {
        Object::Array(items) => items.last().unwrap().clone(),
        other => other.clone(),
    };
    let stream = match doc.resolve(&last).unwrap() {
        Object::Stream(stream) => stream.clone(),
        other => panic!("expected stream, got {:?}", other),
    };
    let content = Content::decode(&stream_data(&stream).unwrap()).unwrap();
    content
        .operations
        .iter()
        .filter(|op| op.operator == "re")
        .map(|op| {
            let v: Vec<f64> = op.operands.iter().map(|o| as_number(o).unwrap()).collect();
            [v[0], v[1], v[2], v[3]]
        })
        .collect()
}

/// Debug rendering of a page's raw `/Contents` entry, for pass-through
/// checks (`lopdf::Object` has no `PartialEq`)
pub fn contents_entry(bytes: &[u8], page: u32) -> String {
    let doc = PdfDocument::from_bytes(bytes).unwrap();
    let page_id = doc.page_id(page).unwrap();
    format!("{:?}", doc.get_dict(page_id).unwrap().get(b"Contents").unwrap())
}

/// Decoded content of a page
pub fn page_content(bytes: &[u8], page: u32) -> Vec<u8> {
    let doc = PdfDocument::from_bytes(bytes).unwrap();
    let page_id = doc.page_id(page).unwrap();
    doc.page_content(page_id).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-3, "{} != {}", actual, expected);
}
