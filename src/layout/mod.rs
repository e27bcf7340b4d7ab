//! Layout extraction
//! Author: kartik4091
//!
//! Produces pages of positioned text runs in top-down page space. Every call
//! parses the document again; nothing is cached between calls.

mod cmap;
mod font;
mod interpreter;

use std::path::Path;

use lopdf::ObjectId;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::pdf_document::PdfDocument;
use crate::types::Page;

pub use cmap::ToUnicodeMap;
pub use font::{FontInfo, FontKind, Glyph};
use interpreter::ContentInterpreter;

/// Extracts page layouts from PDF documents
#[derive(Debug, Clone, Default)]
pub struct LayoutExtractor;

impl LayoutExtractor {
    pub fn new() -> Self {
        Self
    }

    /// All pages of the document at `source`, ascending by page number
    #[instrument(skip(self, source), fields(source = %source.as_ref().display()))]
    pub fn extract(&self, source: impl AsRef<Path>) -> Result<Vec<Page>> {
        let document = PdfDocument::load(source)?;
        Ok(self.extract_document(&document))
    }

    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<Vec<Page>> {
        let document = PdfDocument::from_bytes(bytes)?;
        Ok(self.extract_document(&document))
    }

    /// One page, `Error::PageRange` outside `[1, page_count]`
    pub fn extract_page(&self, source: impl AsRef<Path>, page_number: u32) -> Result<Page> {
        let document = PdfDocument::load(source)?;
        let page_id = document.page_id(page_number)?;
        Ok(self.page_layout(&document, page_number, page_id))
    }

    pub fn extract_page_bytes(&self, bytes: &[u8], page_number: u32) -> Result<Page> {
        let document = PdfDocument::from_bytes(bytes)?;
        let page_id = document.page_id(page_number)?;
        Ok(self.page_layout(&document, page_number, page_id))
    }

    pub fn extract_document(&self, document: &PdfDocument) -> Vec<Page> {
        let pages: Vec<Page> = document
            .page_ids()
            .into_iter()
            .map(|(number, id)| self.page_layout(document, number, id))
            .collect();
        debug!(
            "Extracted {} pages, {} runs",
            pages.len(),
            pages.iter().map(|p| p.runs.len()).sum::<usize>()
        );
        pages
    }

    /// A malformed content stream leaves the page without runs instead of
    /// failing the whole document
    fn page_layout(&self, document: &PdfDocument, number: u32, page_id: ObjectId) -> Page {
        let media = document.media_box(page_id);
        let runs = document
            .page_content(page_id)
            .and_then(|content| {
                ContentInterpreter::new(document, media).run(&content, document.page_resources(page_id))
            })
            .unwrap_or_else(|e| {
                warn!("Page {}: text not extracted: {}", number, e);
                Vec::new()
            });

        Page {
            number,
            width: media.width(),
            height: media.height(),
            runs,
        }
    }
}
