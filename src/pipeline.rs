//! Redaction Pipeline: Stage-by-Stage Execution
//! Author: kartik4091
//!
//! Extract → classify → locate → mask → merge manual regions → compose.
//! Each call owns everything it creates; no state survives between calls.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::classifier::{build_transcript, ClassificationRequest, Classifier};
use crate::compositor::{merge_regions, RedactionCompositor};
use crate::config::RedactionConfig;
use crate::error::Result;
use crate::layout::LayoutExtractor;
use crate::locator::SpanLocator;
use crate::masking::MaskingPolicy;
use crate::types::{ManualRegion, Page, RedactionRecord, RedactionRegion, SensitiveSpan};

/// Result of a full redaction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionOutcome {
    pub spans: Vec<SensitiveSpan>,
    pub records: Vec<RedactionRecord>,
    pub located: usize,
    pub unlocated: usize,
    pub painted: usize,
}

/// Orchestrates the redaction stages for one configuration and classifier
pub struct RedactionPipeline {
    config: RedactionConfig,
    classifier: Arc<dyn Classifier>,
    extractor: LayoutExtractor,
    locator: SpanLocator,
    masking: MaskingPolicy,
    compositor: RedactionCompositor,
}

impl RedactionPipeline {
    pub fn new(config: RedactionConfig, classifier: Arc<dyn Classifier>) -> Self {
        let locator = SpanLocator::from_config(&config.matching);
        let masking = config.masking_policy();
        Self {
            config,
            classifier,
            extractor: LayoutExtractor::new(),
            locator,
            masking,
            compositor: RedactionCompositor::new(),
        }
    }

    pub fn config(&self) -> &RedactionConfig {
        &self.config
    }

    /// Classifier input for an extracted layout
    pub fn request(&self, pages: &[Page]) -> ClassificationRequest {
        ClassificationRequest {
            transcript: build_transcript(pages),
            categories: self.config.enabled_categories(),
            keywords: self.config.keywords(),
        }
    }

    /// Finds and places sensitive spans. Unplaced spans come back as
    /// placeholders; a classifier failure fails the whole step.
    #[instrument(skip(self, source), fields(source = %source.as_ref().display()))]
    pub async fn identify(&self, source: impl AsRef<Path>) -> Result<Vec<SensitiveSpan>> {
        info!("📄 Stage 1: Layout Extraction");
        let pages = self.extractor.extract(source)?;

        info!("🔎 Stage 2: Classification");
        let request = self.request(&pages);
        let classified = self.classifier.classify(&request).await?;

        info!("📍 Stage 3: Span Location");
        let spans = self.locator.locate(&classified, &pages);
        let unlocated = spans.iter().filter(|s| !s.is_located()).count();
        if unlocated > 0 {
            warn!("{} of {} spans could not be placed on the page", unlocated, spans.len());
        }
        Ok(spans)
    }

    /// Display records: located spans first, then manual regions
    pub fn records(&self, spans: &[SensitiveSpan], manual: &[ManualRegion]) -> Vec<RedactionRecord> {
        spans
            .iter()
            .map(|span| RedactionRecord::for_span(span, self.masking.mask(span.category, &span.original_text)))
            .chain(manual.iter().map(RedactionRecord::for_manual))
            .collect()
    }

    pub fn regions(&self, spans: &[SensitiveSpan], manual: &[ManualRegion]) -> Vec<RedactionRegion> {
        merge_regions(spans, manual)
    }

    /// Runs every stage and writes the redacted copy to `target`
    #[instrument(skip(self, source, target, manual), fields(manual = manual.len()))]
    pub async fn execute(
        &self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
        manual: &[ManualRegion],
    ) -> Result<RedactionOutcome> {
        info!("🚦 Starting redaction pipeline");
        let source = source.as_ref();
        let spans = self.identify(source).await?;

        info!("🔏 Stage 4: Masking");
        let records = self.records(&spans, manual);

        info!("🖤 Stage 5: Compositing");
        let regions = self.regions(&spans, manual);
        let painted = self.compositor.compose(source, &regions, target)?;

        let located = spans.iter().filter(|s| s.is_located()).count();
        let outcome = RedactionOutcome {
            unlocated: spans.len() - located,
            located,
            painted,
            spans,
            records,
        };
        info!(
            "✅ Redaction completed: {} located, {} unlocated, {} overlays painted",
            outcome.located, outcome.unlocated, outcome.painted
        );
        Ok(outcome)
    }
}
