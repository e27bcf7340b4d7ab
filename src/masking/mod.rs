//! Display masking
//! Author: kartik4091
//!
//! Masked strings are for records only. Overlay geometry never depends on
//! them.

use crate::types::{CategorySet, SensitiveCategory};

pub const MASK_CHAR: char = '*';

/// Masking transform bound to one category
#[derive(Debug, Clone, Copy)]
pub struct MaskingRule {
    pub enabled: bool,
    pub transform: fn(&str) -> String,
}

impl MaskingRule {
    pub fn apply(&self, text: &str) -> String {
        if !self.enabled || text.is_empty() {
            return text.to_string();
        }
        (self.transform)(text)
    }
}

/// Static registry of transforms. `Other` has none.
pub fn transform_for(category: SensitiveCategory) -> Option<fn(&str) -> String> {
    match category {
        SensitiveCategory::Name => Some(mask_name),
        SensitiveCategory::IdCard => Some(mask_id_card),
        SensitiveCategory::Phone => Some(mask_phone),
        SensitiveCategory::Address => Some(mask_address),
        SensitiveCategory::Other => None,
    }
}

/// Masks `text` for `category`; disabled or empty input is returned as is
pub fn mask(category: SensitiveCategory, text: &str, enabled: bool) -> String {
    match transform_for(category) {
        Some(transform) => MaskingRule { enabled, transform }.apply(text),
        None => text.to_string(),
    }
}

fn masked(count: usize) -> String {
    std::iter::repeat(MASK_CHAR).take(count).collect()
}

fn mask_name(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.count();
            if rest == 0 {
                masked(1)
            } else {
                format!("{}{}", first, masked(rest))
            }
        }
        None => String::new(),
    }
}

fn mask_id_card(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 10 {
        return text.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, masked(chars.len() - 10), tail)
}

/// Middle is always four mask characters, whatever its real length
fn mask_phone(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 11 {
        return text.to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, masked(4), tail)
}

fn mask_address(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 6 {
        return text.to_string();
    }
    let head: String = chars[..6].iter().collect();
    format!("{}{}", head, masked(chars.len() - 6))
}

/// Masking rules with their enabled flags, built from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskingPolicy {
    enabled: CategorySet,
}

impl Default for MaskingPolicy {
    fn default() -> Self {
        Self::new(CategorySet::all())
    }
}

impl MaskingPolicy {
    pub fn new(enabled: CategorySet) -> Self {
        Self { enabled }
    }

    pub fn rule(&self, category: SensitiveCategory) -> Option<MaskingRule> {
        transform_for(category).map(|transform| MaskingRule {
            enabled: self.enabled.has(category),
            transform,
        })
    }

    pub fn mask(&self, category: SensitiveCategory, text: &str) -> String {
        mask(category, text, self.enabled.has(category))
    }
}
