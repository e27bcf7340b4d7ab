//! Sensitive-information categories and their label synonyms

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Closed set of sensitive-information categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveCategory {
    Name,
    IdCard,
    Phone,
    Address,
    /// Catch-all for custom keywords and unrecognised classifier labels
    Other,
}

lazy_static! {
    static ref LABEL_SYNONYMS: HashMap<&'static str, SensitiveCategory> = {
        let mut m = HashMap::new();
        for label in ["name", "姓名"] {
            m.insert(label, SensitiveCategory::Name);
        }
        for label in ["idcard", "身份证号", "身份证"] {
            m.insert(label, SensitiveCategory::IdCard);
        }
        for label in ["phonenumber", "phone", "电话号码", "手机号"] {
            m.insert(label, SensitiveCategory::Phone);
        }
        for label in ["address", "地址"] {
            m.insert(label, SensitiveCategory::Address);
        }
        m
    };
}

impl SensitiveCategory {
    pub const ALL: [SensitiveCategory; 5] = [
        SensitiveCategory::Name,
        SensitiveCategory::IdCard,
        SensitiveCategory::Phone,
        SensitiveCategory::Address,
        SensitiveCategory::Other,
    ];

    /// Maps a classifier type label, case-insensitively; unknown labels map to `Other`
    pub fn from_label(label: &str) -> Self {
        let key = label.trim().to_lowercase();
        LABEL_SYNONYMS
            .get(key.as_str())
            .copied()
            .unwrap_or(SensitiveCategory::Other)
    }

    /// Label shown to record consumers
    pub fn display_label(&self) -> &'static str {
        match self {
            SensitiveCategory::Name => "姓名",
            SensitiveCategory::IdCard => "身份证号",
            SensitiveCategory::Phone => "电话号码",
            SensitiveCategory::Address => "地址",
            SensitiveCategory::Other => "其他",
        }
    }

    /// Description used when asking the classifier for this category
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            SensitiveCategory::Name => "姓名：中国人姓名",
            SensitiveCategory::IdCard => "身份证号：18位身份证号码",
            SensitiveCategory::Phone => "电话号码：11位手机号码",
            SensitiveCategory::Address => "地址：包含省市区的详细地址",
            SensitiveCategory::Other => "自定义关键字（Other）",
        }
    }

    pub fn flag(&self) -> CategorySet {
        match self {
            SensitiveCategory::Name => CategorySet::NAME,
            SensitiveCategory::IdCard => CategorySet::ID_CARD,
            SensitiveCategory::Phone => CategorySet::PHONE,
            SensitiveCategory::Address => CategorySet::ADDRESS,
            SensitiveCategory::Other => CategorySet::OTHER,
        }
    }
}

impl fmt::Display for SensitiveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensitiveCategory::Name => "name",
            SensitiveCategory::IdCard => "id_card",
            SensitiveCategory::Phone => "phone",
            SensitiveCategory::Address => "address",
            SensitiveCategory::Other => "other",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Set of categories enabled for identification and masking
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CategorySet: u8 {
        const NAME = 0b0000_0001;
        const ID_CARD = 0b0000_0010;
        const PHONE = 0b0000_0100;
        const ADDRESS = 0b0000_1000;
        const OTHER = 0b0001_0000;
    }
}

impl CategorySet {
    pub fn has(&self, category: SensitiveCategory) -> bool {
        self.contains(category.flag())
    }

    /// Enabled categories in declaration order
    pub fn categories(&self) -> Vec<SensitiveCategory> {
        SensitiveCategory::ALL
            .iter()
            .copied()
            .filter(|c| self.has(*c))
            .collect()
    }
}

impl FromIterator<SensitiveCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = SensitiveCategory>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CategorySet::empty(), |set, c| set | c.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms_are_case_insensitive() {
        assert_eq!(SensitiveCategory::from_label("IdCard"), SensitiveCategory::IdCard);
        assert_eq!(SensitiveCategory::from_label("身份证"), SensitiveCategory::IdCard);
        assert_eq!(SensitiveCategory::from_label("身份证号"), SensitiveCategory::IdCard);
        assert_eq!(SensitiveCategory::from_label("PHONENUMBER"), SensitiveCategory::Phone);
        assert_eq!(SensitiveCategory::from_label("手机号"), SensitiveCategory::Phone);
        assert_eq!(SensitiveCategory::from_label(" Name "), SensitiveCategory::Name);
        assert_eq!(SensitiveCategory::from_label("地址"), SensitiveCategory::Address);
    }

    #[test]
    fn test_unknown_label_is_other() {
        assert_eq!(SensitiveCategory::from_label("email"), SensitiveCategory::Other);
        assert_eq!(SensitiveCategory::from_label(""), SensitiveCategory::Other);
    }

    #[test]
    fn test_category_set() {
        let set: CategorySet = [SensitiveCategory::Name, SensitiveCategory::Phone]
            .into_iter()
            .collect();
        assert!(set.has(SensitiveCategory::Name));
        assert!(!set.has(SensitiveCategory::Address));
        assert_eq!(set.categories(), vec![SensitiveCategory::Name, SensitiveCategory::Phone]);
    }
}
