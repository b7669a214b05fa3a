/*!
 * Grouped analysis of a single lab report.
 *
 * Detects the issuing laboratory, runs generative extraction per category with an
 * all-or-nothing switch to the deterministic parser, then routes every reading into its
 * category bucket and picks the document's primary type.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AnalysisSettings;
use crate::knowledge::{self, laboratories::{detect_laboratory, Laboratory}};
use crate::llm::client::ChatClient;
use crate::llm::{GenerativeExtractor, GenerativeOutcome};
use crate::models::{
    AnalysisMetadata, Category, GroupedResult, ParsingMethod, ReadingMap, UsageSummary,
};
use crate::ocr::error::OcrError;
use crate::ocr::OcrService;
use crate::parser::{classify_document, DeterministicParser};

/// Reasons a run is aborted before any structured result exists.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

impl AnalysisError {
    pub fn is_input_error(&self) -> bool {
        match self {
            AnalysisError::Ocr(e) => e.is_input_error(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AnalysisError::Ocr(e) => e.error_code(),
        }
    }
}

/// One document taken through the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub source: PathBuf,
    pub sha256: String,
    pub text_length: usize,
    pub result: GroupedResult,
}

pub struct AnalysisService {
    ocr: OcrService,
    client: Arc<dyn ChatClient>,
    parser: DeterministicParser,
}

impl AnalysisService {
    pub fn new(ocr: OcrService, client: Arc<dyn ChatClient>) -> Self {
        Self {
            ocr,
            client,
            parser: DeterministicParser::new(),
        }
    }

    /// Extracts text from `path` and analyzes it. Only input and recognition failures abort.
    pub async fn process_document(&self, path: &Path, settings: &AnalysisSettings) -> Result<PipelineRun, AnalysisError> {
        let text = self.ocr.extract_text(path).await?;
        let bytes = tokio::fs::read(path).await.map_err(OcrError::from)?;
        let sha256 = calculate_file_hash(&bytes);

        let result = self.analyze_text(&text, settings).await;
        let run = PipelineRun {
            id: Uuid::new_v4(),
            source: path.to_path_buf(),
            sha256,
            text_length: text.chars().count(),
            result,
        };
        info!(
            "Run {} for {} finished: {} parameters via {}, primary type {}",
            run.id,
            path.display(),
            run.result.metadata.parameters_found,
            run.result.metadata.parsing_method.as_str(),
            run.result.primary_type
        );
        Ok(run)
    }

    /// Never fails: once text exists the caller always gets a (possibly empty) result.
    pub async fn analyze_text(&self, text: &str, settings: &AnalysisSettings) -> GroupedResult {
        let laboratory = detect_laboratory(text);
        info!("Detected laboratory: {}", laboratory);
        let text_category = classify_document(text);
        debug!("Keyword classification: {:?}", text_category);

        let mut usage = UsageSummary::new(settings.model.clone());
        let (pool, parsing_method) = if settings.generative_enabled {
            let extractor = GenerativeExtractor::new(self.client.clone(), settings.clone());
            match self.extract_generative(&extractor, text, laboratory, &mut usage).await {
                Some(pool) if !pool.is_empty() || !settings.fallback_enabled => (pool, ParsingMethod::Gpt),
                Some(_) => {
                    info!("Generative extraction found nothing, using the deterministic parser");
                    (self.parser.parse_all(text), ParsingMethod::Regex)
                }
                None => {
                    warn!("Generative extraction failed, switching the whole run to the deterministic parser");
                    (self.parser.parse_all(text), ParsingMethod::RegexFallback)
                }
            }
        } else {
            info!("Generative extraction disabled, using the deterministic parser");
            (self.parser.parse_all(text), ParsingMethod::Regex)
        };

        let (mut result, other) = classify_readings(pool);
        let primary_type = determine_primary_type(&result);
        let parameters_found = result.values().map(|b| b.len()).sum::<usize>() + other.len();

        GroupedResult {
            blood_general: result.remove(&Category::BloodGeneral).unwrap_or_default(),
            blood_biochem: result.remove(&Category::BloodBiochem).unwrap_or_default(),
            hormones: result.remove(&Category::Hormones).unwrap_or_default(),
            other,
            primary_type,
            metadata: AnalysisMetadata {
                laboratory,
                parsing_method,
                text_category,
                parameters_found,
                usage: (usage.calls > 0).then_some(usage),
                processed_at: Utc::now(),
            },
        }
    }

    /// Pools readings from one call per category. `None` means a call failed while
    /// fallback is enabled and the run must switch strategies.
    async fn extract_generative(
        &self,
        extractor: &GenerativeExtractor,
        text: &str,
        laboratory: Laboratory,
        usage: &mut UsageSummary,
    ) -> Option<ReadingMap> {
        let fallback_enabled = extractor.settings().fallback_enabled;
        let mut pool = ReadingMap::new();

        for category in Category::ALL {
            match extractor.parse(text, Some(category), laboratory, usage).await {
                GenerativeOutcome::Data(readings) => {
                    for (key, reading) in readings {
                        pool.entry(key).or_insert(reading);
                    }
                }
                GenerativeOutcome::Empty => {}
                GenerativeOutcome::Failure(e) if fallback_enabled => {
                    debug!("Abandoning generative extraction at {}: {}", category, e);
                    return None;
                }
                GenerativeOutcome::Failure(e) => {
                    warn!("Skipping {} after generative failure: {}", category, e);
                }
            }
        }
        Some(pool)
    }
}

/// Routes each pooled reading into the bucket of its catalog category; unknown keys go
/// to the returned `other` map.
pub fn classify_readings(pool: ReadingMap) -> (BTreeMap<Category, ReadingMap>, ReadingMap) {
    let mut buckets: BTreeMap<Category, ReadingMap> = Category::ALL.iter().map(|c| (*c, ReadingMap::new())).collect();
    let mut other = ReadingMap::new();

    for (key, reading) in pool {
        match knowledge::category_of(&key) {
            Some(category) => {
                buckets.entry(category).or_default().insert(key, reading);
            }
            None => {
                warn!("Parameter {} is not in the catalog, filing under other", key);
                other.insert(key, reading);
            }
        }
    }
    (buckets, other)
}

/// Largest bucket wins; ties resolve in `Category::ALL` order, so an empty result is
/// blood_general.
pub fn determine_primary_type(buckets: &BTreeMap<Category, ReadingMap>) -> Category {
    let mut primary = Category::BloodGeneral;
    let mut best = 0;
    for category in Category::ALL {
        let count = buckets.get(&category).map_or(0, |b| b.len());
        if count > best {
            primary = category;
            best = count;
        }
    }
    primary
}

fn calculate_file_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedReading, ReadingStatus};

    fn reading(value: f64) -> ExtractedReading {
        ExtractedReading {
            value,
            operator: None,
            unit: String::new(),
            reference: String::new(),
            status: ReadingStatus::Unknown,
        }
    }

    #[test]
    fn test_classify_routes_by_catalog() {
        let mut pool = ReadingMap::new();
        pool.insert("hemoglobin".into(), reading(140.0));
        pool.insert("tsh".into(), reading(2.0));
        pool.insert("glucose".into(), reading(5.0));
        pool.insert("mystery".into(), reading(1.0));

        let (buckets, other) = classify_readings(pool);
        assert!(buckets[&Category::BloodGeneral].contains_key("hemoglobin"));
        assert!(buckets[&Category::Hormones].contains_key("tsh"));
        assert!(buckets[&Category::BloodBiochem].contains_key("glucose"));
        assert!(other.contains_key("mystery"));
    }

    #[test]
    fn test_primary_type_ties_follow_category_order() {
        let mut buckets = BTreeMap::new();
        assert_eq!(determine_primary_type(&buckets), Category::BloodGeneral);

        let mut biochem = ReadingMap::new();
        biochem.insert("glucose".into(), reading(5.0));
        let mut hormones = ReadingMap::new();
        hormones.insert("tsh".into(), reading(2.0));
        buckets.insert(Category::BloodBiochem, biochem);
        buckets.insert(Category::Hormones, hormones.clone());
        assert_eq!(determine_primary_type(&buckets), Category::BloodBiochem);

        hormones.insert("free_t4".into(), reading(15.0));
        buckets.insert(Category::Hormones, hormones);
        assert_eq!(determine_primary_type(&buckets), Category::Hormones);
    }

    #[test]
    fn test_file_hash() {
        assert_eq!(
            calculate_file_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
