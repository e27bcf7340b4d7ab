//! Span location
//! Author: kartik4091
//!
//! Places classifier-reported text on the page layout by fuzzy matching it
//! against every text run.

mod similarity;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::ClassifiedSpan;
use crate::config::MatchingConfig;
use crate::types::{Page, SensitiveCategory, SensitiveSpan, TextRun};

pub use similarity::{levenshtein, normalize, similarity};

/// Scores must be strictly greater than this to count as a match
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// How a match is chosen across pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Stop at the first page whose best run qualifies, even if a later page
    /// would score higher
    #[default]
    FirstQualifyingPage,
    /// Take the highest-scoring run of the whole document
    BestOverall,
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'p> {
    page: u32,
    run: &'p TextRun,
    score: f64,
}

#[derive(Debug, Clone)]
pub struct SpanLocator {
    policy: MatchPolicy,
    threshold: f64,
}

impl Default for SpanLocator {
    fn default() -> Self {
        Self::new(MatchPolicy::default(), DEFAULT_THRESHOLD)
    }
}

impl SpanLocator {
    pub fn new(policy: MatchPolicy, threshold: f64) -> Self {
        Self { policy, threshold }
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(config.policy, config.threshold)
    }

    /// Locates every span. Spans without text are skipped; spans that match
    /// nothing come back as placeholders on page 1 with the zero box.
    pub fn locate(&self, spans: &[ClassifiedSpan], pages: &[Page]) -> Vec<SensitiveSpan> {
        let mut ordered: Vec<&Page> = pages.iter().collect();
        ordered.sort_by_key(|p| p.number);

        spans
            .iter()
            .filter_map(|span| match span.text.as_deref() {
                Some(text) if !text.trim().is_empty() => Some((span.category(), text)),
                _ => {
                    debug!("Skipping {} span without text", span.label);
                    None
                }
            })
            .map(|(category, text)| self.locate_text(category, text, &ordered))
            .collect()
    }

    fn locate_text(&self, category: SensitiveCategory, text: &str, pages: &[&Page]) -> SensitiveSpan {
        let found = match self.policy {
            MatchPolicy::FirstQualifyingPage => pages
                .iter()
                .filter_map(|page| best_on_page(text, page))
                .find(|c| c.score > self.threshold),
            MatchPolicy::BestOverall => pages
                .iter()
                .filter_map(|page| best_on_page(text, page))
                .fold(None, |best: Option<Candidate>, c| match best {
                    Some(b) if b.score >= c.score => Some(b),
                    _ => Some(c),
                })
                .filter(|c| c.score > self.threshold),
        };

        match found {
            Some(candidate) => {
                debug!(
                    "Located '{}' on page {} (score {:.2})",
                    text, candidate.page, candidate.score
                );
                SensitiveSpan {
                    category,
                    original_text: text.to_string(),
                    page: candidate.page,
                    bbox: candidate.run.bbox,
                }
            }
            None => {
                debug!("No run matches '{}', emitting placeholder", text);
                SensitiveSpan::placeholder(category, text)
            }
        }
    }
}

/// Highest-scoring run of a page; the first run wins ties
fn best_on_page<'p>(text: &str, page: &'p Page) -> Option<Candidate<'p>> {
    let mut best: Option<Candidate<'p>> = None;
    for run in &page.runs {
        let score = similarity(text, &run.text);
        if best.map_or(true, |b| score > b.score) {
            best = Some(Candidate {
                page: page.number,
                run,
                score,
            });
        }
    }
    best
}
