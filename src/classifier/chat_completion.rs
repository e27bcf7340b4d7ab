//! Chat-completion classifier over HTTP
//!
//! Speaks the OpenAI-style `/chat/completions` protocol that DeepSeek and
//! compatible services expose.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{ClassificationRequest, ClassifiedSpan, Classifier};
use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use crate::types::SensitiveCategory;

const TEMPERATURE: f64 = 0.1;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").unwrap();
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
}

pub struct ChatCompletionClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl ChatCompletionClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Classifier api_key is not set".into()));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("pdx-redact/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Identify(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Instructions listing every enabled category, then the keywords
    pub fn system_prompt(request: &ClassificationRequest) -> String {
        let mut prompt = String::from(
            "你是一个专业的敏感信息识别助手。请从用户提供的文本中识别出以下类型的敏感信息,要求返回所有的，如若有重复项，也需要返回：\n",
        );
        let categories = request
            .categories
            .categories()
            .into_iter()
            .filter(|c| *c != SensitiveCategory::Other);
        let mut index = 0;
        for category in categories {
            index += 1;
            prompt.push_str(&format!("{}. {}\n", index, category.prompt_hint()));
        }
        if !request.keywords.is_empty() {
            index += 1;
            prompt.push_str(&format!(
                "{}. {}：请识别出以下自定义关键字：\n",
                index,
                SensitiveCategory::Other.prompt_hint()
            ));
            for keyword in &request.keywords {
                prompt.push_str(&format!("   - {}\n", keyword));
            }
        }
        prompt.push_str("请按照以下JSON格式返回结果：\n");
        prompt.push_str("[{\"type\": \"敏感信息类型\", \"text\": \"敏感信息文本\"}]\n");
        prompt
    }

    async fn request(&self, request: &ClassificationRequest) -> Result<String> {
        let messages = vec![
            Message {
                role: "system".into(),
                content: Self::system_prompt(request),
            },
            Message {
                role: "user".into(),
                content: request.transcript.clone(),
            },
        ];
        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": TEMPERATURE,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Identify(format!("Classifier request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Identify(format!("Failed to read classifier response: {}", e)))?;
        if !status.is_success() {
            return Err(Error::Identify(format!(
                "Classifier returned {}: {}",
                status.as_u16(),
                text
            )));
        }
        Ok(text)
    }
}

/// Spans from a completion body; the content may be wrapped in a code fence
pub fn parse_completion(body: &str) -> Result<Vec<ClassifiedSpan>> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::Identify(format!("Malformed classifier response: {}", e)))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::Identify("Classifier response has no choices".into()))?;

    let payload = CODE_FENCE
        .captures(&content)
        .and_then(|c| c.get(1))
        .map_or(content.as_str(), |m| m.as_str());
    serde_json::from_str(payload.trim())
        .map_err(|e| Error::Identify(format!("Classifier content is not a span list: {}", e)))
}

#[async_trait]
impl Classifier for ChatCompletionClassifier {
    #[instrument(skip(self, request), fields(model = %self.config.model, chars = request.transcript.len()))]
    async fn classify(&self, request: &ClassificationRequest) -> Result<Vec<ClassifiedSpan>> {
        info!("🔎 Asking classifier for {} categories", request.categories.categories().len());
        let body = self.request(request).await?;
        let spans = parse_completion(&body)?;
        debug!("Classifier returned {} spans", spans.len());
        Ok(spans)
    }
}
