use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::knowledge::laboratories::Laboratory;

/// Analysis family a parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BloodGeneral,
    BloodBiochem,
    Hormones,
}

impl Category {
    /// Evaluation order used by extraction passes and primary-type tie-breaking.
    pub const ALL: [Category; 3] = [Category::BloodGeneral, Category::BloodBiochem, Category::Hormones];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BloodGeneral => "blood_general",
            Category::BloodBiochem => "blood_biochem",
            Category::Hormones => "hormones",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of keyword classification over a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCategory {
    BloodGeneral,
    BloodBiochem,
    Hormones,
    Unknown,
}

impl From<Category> for TextCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::BloodGeneral => TextCategory::BloodGeneral,
            Category::BloodBiochem => TextCategory::BloodBiochem,
            Category::Hormones => TextCategory::Hormones,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[serde(rename = "норма")]
    Normal,
    #[serde(rename = "повышен")]
    Elevated,
    #[serde(rename = "понижен")]
    Decreased,
    #[serde(rename = "неизвестно")]
    Unknown,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Normal => "норма",
            ReadingStatus::Elevated => "повышен",
            ReadingStatus::Decreased => "понижен",
            ReadingStatus::Unknown => "неизвестно",
        }
    }

    /// Accepts the Russian labels plus the English spellings language models tend to return.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "норма" | "normal" | "in range" | "ok" => Some(ReadingStatus::Normal),
            "повышен" | "повышено" | "высокий" | "high" | "elevated" | "above" => Some(ReadingStatus::Elevated),
            "понижен" | "понижено" | "низкий" | "low" | "decreased" | "below" => Some(ReadingStatus::Decreased),
            "неизвестно" | "unknown" => Some(ReadingStatus::Unknown),
            _ => None,
        }
    }
}

/// Comparison operator on a censored value such as `< 0.30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "≤")]
    LessOrEqual,
    #[serde(rename = "≥")]
    GreaterOrEqual,
}

impl Comparison {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Comparison::Less),
            ">" => Some(Comparison::Greater),
            "≤" | "<=" => Some(Comparison::LessOrEqual),
            "≥" | ">=" => Some(Comparison::GreaterOrEqual),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::Greater => ">",
            Comparison::LessOrEqual => "≤",
            Comparison::GreaterOrEqual => "≥",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReading {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Comparison>,
    pub unit: String,
    pub reference: String,
    pub status: ReadingStatus,
}

pub type ReadingMap = BTreeMap<String, ExtractedReading>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingMethod {
    Gpt,
    Regex,
    RegexFallback,
}

impl ParsingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParsingMethod::Gpt => "gpt",
            ParsingMethod::Regex => "regex",
            ParsingMethod::RegexFallback => "regex_fallback",
        }
    }
}

/// Token and cost accounting across every generative call of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub model: String,
    pub calls: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost_usd: f64,
}

impl UsageSummary {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, prompt_tokens: u64, completion_tokens: u64, cost_usd: f64) {
        self.calls += 1;
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        self.cost_usd += cost_usd;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub laboratory: Laboratory,
    pub parsing_method: ParsingMethod,
    pub text_category: TextCategory,
    pub parameters_found: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSummary>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedResult {
    pub blood_general: ReadingMap,
    pub blood_biochem: ReadingMap,
    pub hormones: ReadingMap,
    pub other: ReadingMap,
    pub primary_type: Category,
    pub metadata: AnalysisMetadata,
}

impl GroupedResult {
    pub fn bucket(&self, category: Category) -> &ReadingMap {
        match category {
            Category::BloodGeneral => &self.blood_general,
            Category::BloodBiochem => &self.blood_biochem,
            Category::Hormones => &self.hormones,
        }
    }

    /// Looks a reading up in whichever bucket holds it, `other` included.
    pub fn reading(&self, key: &str) -> Option<&ExtractedReading> {
        Category::ALL
            .iter()
            .find_map(|c| self.bucket(*c).get(key))
            .or_else(|| self.other.get(key))
    }

    pub fn total_parameters(&self) -> usize {
        self.blood_general.len() + self.blood_biochem.len() + self.hormones.len() + self.other.len()
    }
}
