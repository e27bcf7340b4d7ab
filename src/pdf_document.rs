//! PDF Document abstraction
//! Author: kartik4091
//!
//! Owns one parsed `lopdf::Document` for the duration of a single operation.
//! Callers open, use and drop it inside one function, so the parsed document
//! is released on every exit path, error paths included.

use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{Error, Result};

/// US Letter, used when no MediaBox exists anywhere in the page tree
const DEFAULT_MEDIA_BOX: MediaBox = MediaBox {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// Visible page rectangle in user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl MediaBox {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// PDF Document wrapper for loading and processing
#[derive(Debug)]
pub struct PdfDocument {
    document: lopdf::Document,
}

impl PdfDocument {
    /// Load a PDF document from file path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = lopdf::Document::load(path)
            .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;
        debug!("Opened {} ({} objects)", path.display(), document.objects.len());
        Ok(Self { document })
    }

    /// Load a PDF document held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let document = lopdf::Document::load_mem(bytes).map_err(Error::parse)?;
        Ok(Self { document })
    }

    pub fn inner(&self) -> &lopdf::Document {
        &self.document
    }

    pub fn inner_mut(&mut self) -> &mut lopdf::Document {
        &mut self.document
    }

    /// Page object ids in ascending page-number order
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        self.document.get_pages().into_iter().collect()
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Looks up a 1-based page number
    pub fn page_id(&self, number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages.get(&number).copied().ok_or(Error::PageRange {
            page: number,
            count: pages.len() as u32,
        })
    }

    pub fn get_dict(&self, id: ObjectId) -> Result<&Dictionary> {
        self.document
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(Error::parse)
    }

    /// Follows a reference chain to the underlying object
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        let mut current = object;
        for _ in 0..32 {
            match current {
                Object::Reference(id) => {
                    current = self.document.get_object(*id).map_err(Error::parse)?;
                }
                other => return Ok(other),
            }
        }
        Err(Error::Parse("Reference chain too deep".into()))
    }

    /// Resolves `key` in `dict` to a dictionary, if present
    pub fn resolve_dict<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
        let object = dict.get(key).ok()?;
        match self.resolve(object).ok()? {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Walks the page and its ancestors for an inheritable attribute
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page_id);
        let mut depth = 0;
        while let Some(id) = current {
            let dict = self.get_dict(id).ok()?;
            if let Ok(value) = dict.get(key) {
                return self.resolve(value).ok();
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
            if depth > 64 {
                break;
            }
        }
        None
    }

    pub fn media_box(&self, page_id: ObjectId) -> MediaBox {
        let values = match self.inherited(page_id, b"MediaBox") {
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|o| self.resolve(o).ok().and_then(as_number))
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        };

        if values.len() != 4 {
            return DEFAULT_MEDIA_BOX;
        }
        MediaBox {
            x0: values[0].min(values[2]),
            y0: values[1].min(values[3]),
            x1: values[0].max(values[2]),
            y1: values[1].max(values[3]),
        }
    }

    /// Resource dictionary of a page, inherited through the page tree
    pub fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        match self.inherited(page_id, b"Resources")? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Decoded, concatenated content streams of a page
    pub fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page = self.get_dict(page_id)?;
        let contents = match page.get(b"Contents") {
            Ok(object) => self.resolve(object)?,
            Err(_) => return Ok(Vec::new()),
        };

        let mut data = Vec::new();
        match contents {
            Object::Stream(stream) => data.extend(stream_data(stream)?),
            Object::Array(parts) => {
                for part in parts {
                    if let Object::Stream(stream) = self.resolve(part)? {
                        data.extend(stream_data(stream)?);
                        data.push(b'\n');
                    }
                }
            }
            _ => {}
        }
        Ok(data)
    }

    /// Persists the document to `path`
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.document
            .save(path)
            .map_err(|e| Error::Write(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Serializes the document into memory
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.document.save_to(&mut buffer).map_err(Error::write)?;
        Ok(buffer)
    }
}

/// Numeric value of an integer or real object
pub fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Decoded bytes of a stream. Filters (Flate with predictors, LZW) are
/// undone by lopdf; a stream without `/Filter` is returned as stored.
pub fn stream_data(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream.decompressed_content().map_err(|e| {
        let filters = stream.filters().unwrap_or_default().join(", ");
        Error::Parse(format!("Cannot decode stream ({}): {:?}", filters, e))
    })
}
