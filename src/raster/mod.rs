//! Approximate page previews
//! Author: kartik4091
//!
//! Redraws the extracted text runs onto a white canvas with a system font.
//! Real glyph shapes, embedded fonts and images are not rendered.

mod fonts;

use std::io::Cursor;
use std::path::Path;

use ab_glyph::FontVec;
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::layout::LayoutExtractor;
use crate::types::Page;

pub use fonts::FONT_CANDIDATES;

/// Points per inch
const POINTS_PER_INCH: f64 = 72.0;

/// Largest canvas rendered, in pixels
const MAX_PIXELS: u64 = 100_000_000;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BLOCK_GREY: Rgb<u8> = Rgb([190, 190, 190]);

pub struct PageRasterizer {
    extractor: LayoutExtractor,
    font: Option<FontVec>,
}

impl Default for PageRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer {
    /// Looks up the preview font in the system font database
    pub fn new() -> Self {
        Self::with_font(fonts::load_preview_font())
    }

    /// Rasterizer with an explicit font; `None` draws runs as grey blocks
    pub fn with_font(font: Option<FontVec>) -> Self {
        Self {
            extractor: LayoutExtractor::new(),
            font,
        }
    }

    /// PNG of one page, or an empty vector on any failure
    pub fn rasterize(&self, source: impl AsRef<Path>, page_number: u32, dpi: u32) -> Vec<u8> {
        self.extractor
            .extract_page(source, page_number)
            .and_then(|page| self.encode_png(&page, dpi))
            .unwrap_or_else(|e| {
                warn!("Preview of page {} failed: {}", page_number, e);
                Vec::new()
            })
    }

    pub fn rasterize_bytes(&self, bytes: &[u8], page_number: u32, dpi: u32) -> Vec<u8> {
        self.extractor
            .extract_page_bytes(bytes, page_number)
            .and_then(|page| self.encode_png(&page, dpi))
            .unwrap_or_else(|e| {
                warn!("Preview of page {} failed: {}", page_number, e);
                Vec::new()
            })
    }

    pub fn render(&self, page: &Page, dpi: u32) -> Result<RgbImage> {
        let scale = dpi as f64 / POINTS_PER_INCH;
        let width = (page.width * scale).floor();
        let height = (page.height * scale).floor();
        if width < 1.0 || height < 1.0 || (width * height) as u64 > MAX_PIXELS {
            return Err(Error::Parse(format!(
                "Cannot render a {}x{} canvas at {} dpi",
                width, height, dpi
            )));
        }

        let mut canvas = RgbImage::from_pixel(width as u32, height as u32, WHITE);
        for run in &page.runs {
            let x = (run.bbox.left * scale).round() as i32;
            let y = (run.bbox.top * scale).round() as i32;
            let size = (run.bbox.height * scale) as f32;
            if size <= 0.0 {
                continue;
            }
            match &self.font {
                Some(font) => draw_text_mut(&mut canvas, BLACK, x, y, size, font, &run.text),
                None => {
                    let w = ((run.bbox.width * scale).round() as u32).max(1);
                    let h = ((run.bbox.height * scale).round() as u32).max(1);
                    draw_filled_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), BLOCK_GREY);
                }
            }
        }
        debug!("Rendered page {} at {}x{}", page.number, width, height);
        Ok(canvas)
    }

    fn encode_png(&self, page: &Page, dpi: u32) -> Result<Vec<u8>> {
        let canvas = self.render(page, dpi)?;
        let mut bytes = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(Error::write)?;
        Ok(bytes)
    }
}
