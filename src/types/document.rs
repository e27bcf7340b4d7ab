use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BoundingBox, SensitiveCategory};

/// One physical page of an extracted layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    /// Width in points
    pub width: f64,
    /// Height in points
    pub height: f64,
    /// Text runs in content-stream order (not necessarily reading order)
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bbox: BoundingBox,
}

/// A classifier-reported span after location against the layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveSpan {
    pub category: SensitiveCategory,
    pub original_text: String,
    pub page: u32,
    pub bbox: BoundingBox,
}

impl SensitiveSpan {
    /// Span for text that matched no run: page 1 with the zero box
    pub fn placeholder(category: SensitiveCategory, original_text: impl Into<String>) -> Self {
        Self {
            category,
            original_text: original_text.into(),
            page: 1,
            bbox: BoundingBox::ZERO,
        }
    }

    pub fn is_located(&self) -> bool {
        !self.bbox.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionOrigin {
    Located,
    Manual,
}

/// The unit consumed by the compositor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionRegion {
    pub page: u32,
    pub bbox: Option<BoundingBox>,
    pub origin: RegionOrigin,
}

impl From<&SensitiveSpan> for RedactionRegion {
    /// Unlocated spans carry no box and are skipped when compositing
    fn from(span: &SensitiveSpan) -> Self {
        Self {
            page: span.page,
            bbox: span.is_located().then_some(span.bbox),
            origin: RegionOrigin::Located,
        }
    }
}

/// A caller-drawn region; its storage belongs to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualRegion {
    pub id: Uuid,
    pub page: u32,
    pub bbox: BoundingBox,
    pub created_at: DateTime<Utc>,
}

impl ManualRegion {
    pub fn new(page: u32, bbox: BoundingBox) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            bbox,
            created_at: Utc::now(),
        }
    }
}

impl From<&ManualRegion> for RedactionRegion {
    fn from(region: &ManualRegion) -> Self {
        Self {
            page: region.page,
            bbox: Some(region.bbox),
            origin: RegionOrigin::Manual,
        }
    }
}

/// Display record for a matched span or a manual region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionRecord {
    pub category: String,
    pub original_text: String,
    pub masked_text: String,
    pub page: u32,
    pub position: String,
    pub manual: bool,
}

impl RedactionRecord {
    pub const MANUAL_CATEGORY: &'static str = "手动区域";
    pub const MANUAL_TEXT: &'static str = "手动选择区域";
    pub const MANUAL_MASKED: &'static str = "已脱敏";

    pub fn for_span(span: &SensitiveSpan, masked_text: String) -> Self {
        Self {
            category: span.category.display_label().to_string(),
            original_text: span.original_text.clone(),
            masked_text,
            page: span.page,
            position: format_position(&span.bbox),
            manual: false,
        }
    }

    pub fn for_manual(region: &ManualRegion) -> Self {
        Self {
            category: Self::MANUAL_CATEGORY.to_string(),
            original_text: Self::MANUAL_TEXT.to_string(),
            masked_text: Self::MANUAL_MASKED.to_string(),
            page: region.page,
            position: format_position(&region.bbox),
            manual: true,
        }
    }
}

fn format_position(bbox: &BoundingBox) -> String {
    format!("({:.1}, {:.1})", bbox.left, bbox.top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_span() {
        let span = SensitiveSpan::placeholder(SensitiveCategory::Name, "王五");
        assert_eq!(span.page, 1);
        assert!(span.bbox.is_zero());
        assert!(!span.is_located());

        let region = RedactionRegion::from(&span);
        assert_eq!(region.bbox, None);
        assert_eq!(region.origin, RegionOrigin::Located);
    }

    #[test]
    fn test_manual_record() {
        let region = ManualRegion::new(2, BoundingBox::new(12.34, 56.78, 10.0, 10.0));
        let record = RedactionRecord::for_manual(&region);
        assert!(record.manual);
        assert_eq!(record.page, 2);
        assert_eq!(record.position, "(12.3, 56.8)");
        assert_eq!(record.masked_text, "已脱敏");
    }
}
