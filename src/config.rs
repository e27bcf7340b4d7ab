//! Configuration types and validation for the redaction pipeline
//! Author: kartik4091
//!
//! Configuration is an explicit value: it is loaded once and handed to the
//! components that need it. Nothing reads it from ambient state.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::locator::MatchPolicy;
use crate::masking::MaskingPolicy;
use crate::types::{CategorySet, SensitiveCategory};

pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub rules: Vec<RuleConfig>,
    pub classifier: ClassifierConfig,
    pub matching: MatchingConfig,
}

/// Per-category rule toggle, plus keywords for the catch-all category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub category: SensitiveCategory,
    #[serde(default)]
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Settings for the chat-completion classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Location policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub policy: MatchPolicy,
    /// Scores must be strictly greater than this to qualify
    pub threshold: f64,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for RedactionConfig {
    fn default() -> Self {
        let rule = |category: SensitiveCategory, name: &str| RuleConfig {
            category,
            name: name.to_string(),
            enabled: true,
            keywords: Vec::new(),
        };

        Self {
            rules: vec![
                rule(SensitiveCategory::Name, "姓名脱敏"),
                rule(SensitiveCategory::IdCard, "身份证号脱敏"),
                rule(SensitiveCategory::Phone, "电话号码脱敏"),
                rule(SensitiveCategory::Address, "地址脱敏"),
            ],
            classifier: ClassifierConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::FirstQualifyingPage,
            threshold: 0.5,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RedactionConfig {
    /// Loads a JSON or YAML configuration file.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        let config = Self::parse_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses JSON first, then YAML
    pub fn parse_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| Error::Config(format!("Config parsing error: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.matching.threshold) {
            return Err(Error::Config(format!(
                "Match threshold must be in [0, 1), got {}",
                self.matching.threshold
            )));
        }
        if !self.classifier.api_key.is_empty() && self.classifier.endpoint.trim().is_empty() {
            return Err(Error::Config("Classifier endpoint is empty".into()));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(Error::Config("Classifier timeout must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Categories with an enabled rule. `Other` is enabled when it has keywords.
    pub fn enabled_categories(&self) -> CategorySet {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .filter(|r| r.category != SensitiveCategory::Other || !r.keywords.is_empty())
            .map(|r| r.category)
            .collect()
    }

    /// Keywords of the catch-all rule
    pub fn keywords(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| r.category == SensitiveCategory::Other && r.enabled)
            .flat_map(|r| r.keywords.iter().cloned())
            .collect()
    }

    pub fn masking_policy(&self) -> MaskingPolicy {
        MaskingPolicy::new(self.enabled_categories())
    }

    /// Writes the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json).map_err(Error::write)
    }
}
