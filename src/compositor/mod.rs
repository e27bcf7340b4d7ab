//! Redaction compositing
//! Author: kartik4091
//!
//! Paints opaque rectangles over redaction regions in a copy of the
//! document. This is an overlay only: the text underneath stays in the
//! content stream and can still be extracted from the output.

mod overlay;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::pdf_document::PdfDocument;
use crate::types::{BoundingBox, ManualRegion, OverlayRect, RedactionRegion, SensitiveSpan};

pub use overlay::{overlay_operations, FILL_RGB};

/// Converts a top-down box to PDF user space.
///
/// The output Y is `page_height - top`. Only `top` anchors the rectangle;
/// width and height are carried over unchanged.
pub fn to_bottom_up(bbox: &BoundingBox, page_height: f64) -> OverlayRect {
    OverlayRect {
        x: bbox.left,
        y: page_height - bbox.top,
        width: bbox.width,
        height: bbox.height,
    }
}

/// Regions for located spans followed by the caller's manual regions
pub fn merge_regions(spans: &[SensitiveSpan], manual: &[ManualRegion]) -> Vec<RedactionRegion> {
    spans
        .iter()
        .map(RedactionRegion::from)
        .chain(manual.iter().map(RedactionRegion::from))
        .collect()
}

/// Boxes to paint per page; regions without a box or with page 0 are dropped
pub fn group_by_page(regions: &[RedactionRegion]) -> BTreeMap<u32, Vec<BoundingBox>> {
    let mut pages: BTreeMap<u32, Vec<BoundingBox>> = BTreeMap::new();
    for region in regions {
        if let (Some(bbox), true) = (region.bbox, region.page > 0) {
            pages.entry(region.page).or_default().push(bbox);
        }
    }
    pages
}

#[derive(Debug, Clone, Default)]
pub struct RedactionCompositor;

impl RedactionCompositor {
    pub fn new() -> Self {
        Self
    }

    /// Writes a redacted copy of `source` to `target`
    #[instrument(skip(self, source, regions, target), fields(regions = regions.len()))]
    pub fn compose(
        &self,
        source: impl AsRef<Path>,
        regions: &[RedactionRegion],
        target: impl AsRef<Path>,
    ) -> Result<usize> {
        let (source, target) = (source.as_ref(), target.as_ref());
        if is_same_file(source, target) {
            return Err(Error::Write(format!(
                "Refusing to overwrite the input document {}",
                source.display()
            )));
        }

        let mut document = PdfDocument::load(source)?;
        let painted = self.apply(&mut document, regions)?;
        document.save(target)?;
        info!("🖤 Painted {} overlays into {}", painted, target.display());
        Ok(painted)
    }

    pub fn compose_bytes(&self, bytes: &[u8], regions: &[RedactionRegion]) -> Result<Vec<u8>> {
        let mut document = PdfDocument::from_bytes(bytes)?;
        self.apply(&mut document, regions)?;
        document.to_bytes()
    }

    /// Paints overlays into an open document, returning how many were painted
    pub fn apply(&self, document: &mut PdfDocument, regions: &[RedactionRegion]) -> Result<usize> {
        let mut painted = 0;
        for (page, boxes) in group_by_page(regions) {
            let page_id = match document.page_id(page) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Skipping {} regions: {}", boxes.len(), e);
                    continue;
                }
            };

            let media = document.media_box(page_id);
            let rects: Vec<OverlayRect> = boxes
                .iter()
                .map(|bbox| to_bottom_up(bbox, media.height()))
                .map(|rect| OverlayRect {
                    x: rect.x + media.x0,
                    y: rect.y + media.y0,
                    ..rect
                })
                .collect();

            debug!("Page {}: {} overlays", page, rects.len());
            overlay::append_overlay(document.inner_mut(), page_id, &rects)?;
            painted += rects.len();
        }
        Ok(painted)
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RegionOrigin, SensitiveCategory};

    #[test]
    fn test_to_bottom_up_uses_top_anchor() {
        let rect = to_bottom_up(&BoundingBox::new(100.0, 200.0, 50.0, 20.0), 800.0);
        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.y, 600.0);
        assert_eq!(rect.width, 50.0);
        assert_eq!(rect.height, 20.0);
    }

    #[test]
    fn test_placeholder_spans_paint_nothing() {
        let placeholder = SensitiveSpan::placeholder(SensitiveCategory::Address, "北京市朝阳区");
        let regions = merge_regions(&[placeholder], &[]);

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].page, 1);
        assert_eq!(regions[0].bbox, None);
        assert!(group_by_page(&regions).is_empty());
    }

    #[test]
    fn test_group_filters_and_keeps_overlaps() {
        let b = BoundingBox::new(1.0, 1.0, 5.0, 5.0);
        let regions = vec![
            RedactionRegion {
                page: 2,
                bbox: Some(b),
                origin: RegionOrigin::Located,
            },
            RedactionRegion {
                page: 2,
                bbox: Some(b),
                origin: RegionOrigin::Manual,
            },
            RedactionRegion {
                page: 0,
                bbox: Some(b),
                origin: RegionOrigin::Manual,
            },
            RedactionRegion {
                page: 1,
                bbox: None,
                origin: RegionOrigin::Located,
            },
        ];
        let grouped = group_by_page(&regions);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&2], vec![b, b]);
    }

    #[test]
    fn test_merge_keeps_order_and_origin() {
        let spans = vec![
            SensitiveSpan {
                category: SensitiveCategory::Name,
                original_text: "张三".into(),
                page: 1,
                bbox: BoundingBox::new(10.0, 10.0, 40.0, 20.0),
            },
            SensitiveSpan::placeholder(SensitiveCategory::Phone, "13800000000"),
        ];
        let manual = vec![ManualRegion::new(2, BoundingBox::new(0.0, 0.0, 100.0, 30.0))];

        let regions = merge_regions(&spans, &manual);
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].origin, RegionOrigin::Located);
        assert!(regions[1].bbox.is_none());
        assert_eq!(regions[2].origin, RegionOrigin::Manual);
        assert_eq!(regions[2].page, 2);
    }
}
