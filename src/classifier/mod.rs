//! Classifier port
//! Author: kartik4091
//!
//! Detection of sensitive text is delegated to a classifier. The pipeline
//! only depends on the `Classifier` trait, so tests and offline runs can
//! plug in a fixed list instead of the network service.

mod chat_completion;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{CategorySet, Page, SensitiveCategory};

pub use chat_completion::ChatCompletionClassifier;

/// What the classifier is asked to find
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    /// Full document text
    pub transcript: String,
    pub categories: CategorySet,
    /// Literals for the catch-all category
    pub keywords: Vec<String>,
}

/// One `{type, text}` entry returned by a classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSpan {
    #[serde(rename = "type", default)]
    pub label: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ClassifiedSpan {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: Some(text.into()),
        }
    }

    pub fn category(&self) -> SensitiveCategory {
        SensitiveCategory::from_label(&self.label)
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// A failure aborts identification; no partial list is returned
    async fn classify(&self, request: &ClassificationRequest) -> Result<Vec<ClassifiedSpan>>;
}

/// Document text with one run per line, pages in order
pub fn build_transcript(pages: &[Page]) -> String {
    let mut transcript = String::new();
    for run in pages.iter().flat_map(|page| page.runs.iter()) {
        transcript.push_str(&run.text);
        transcript.push('\n');
    }
    transcript
}

/// Returns the same spans for every request
#[derive(Debug, Clone, Default)]
pub struct StaticClassifier {
    spans: Vec<ClassifiedSpan>,
}

impl StaticClassifier {
    pub fn new(spans: Vec<ClassifiedSpan>) -> Self {
        Self { spans }
    }

    /// Reads a JSON array of `{type, text}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map(Self::new).map_err(Error::identify)
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, _request: &ClassificationRequest) -> Result<Vec<ClassifiedSpan>> {
        Ok(self.spans.clone())
    }
}
