//! Main Library File for PDF Redaction
//! Provides a stage-based pipeline that finds sensitive text in a PDF,
//! places it on the page and paints opaque overlays over it.
//!
//! Redaction here is overlay-only. The compositor never removes text from
//! the content stream, so text under a black box can still be copied or
//! extracted from the output document. Callers that need true deletion must
//! post-process the output.

// Configuration and Core Pipeline
pub mod config;
pub mod error;
pub mod pdf_document;
pub mod pipeline;
pub mod types;

// Stage 1: Layout Extraction
pub mod layout;

// Stage 2: Classification
pub mod classifier;

// Stage 3: Span Location
pub mod locator;

// Stage 4: Masking
pub mod masking;

// Stage 5: Compositing
pub mod compositor;

// Previews and Reporting
pub mod raster;
pub mod report;

// Re-exports for crate consumers
pub use classifier::{ChatCompletionClassifier, ClassificationRequest, ClassifiedSpan, Classifier, StaticClassifier};
pub use compositor::RedactionCompositor;
pub use config::RedactionConfig;
pub use error::{Error, Result};
pub use layout::LayoutExtractor;
pub use locator::{MatchPolicy, SpanLocator};
pub use masking::{mask, MaskingPolicy, MaskingRule};
pub use pipeline::{RedactionOutcome, RedactionPipeline};
pub use raster::PageRasterizer;
pub use report::{write_manifest, RedactionManifest};
pub use types::{
    BoundingBox, CategorySet, ManualRegion, OverlayRect, Page, RedactionRecord, RedactionRegion, RegionOrigin,
    SensitiveCategory, SensitiveSpan, TextRun,
};
