//! Generative extraction through an OpenAI-compatible language model.
//!
//! Every failure here is strategy-local: callers get a [`GenerativeOutcome`] and decide
//! whether to fall back to the deterministic parser.

pub mod client;
pub mod error;
pub mod pricing;
pub mod prompts;

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AnalysisSettings;
use crate::knowledge::{self, laboratories::Laboratory, units};
use crate::models::{Category, ExtractedReading, ReadingMap, ReadingStatus, UsageSummary};
use crate::parser::fields::parse_reference;
use crate::parser::{parse_value_with_operator, reorder_unit_first_rows};

use client::{ChatClient, ChatMessage, ChatRequest, ResponseFormat};
pub use error::GenerativeError;

/// Three-way result of one generative call.
#[derive(Debug)]
pub enum GenerativeOutcome {
    Data(ReadingMap),
    Empty,
    Failure(GenerativeError),
}

pub struct GenerativeExtractor {
    client: Arc<dyn ChatClient>,
    settings: AnalysisSettings,
}

impl GenerativeExtractor {
    pub fn new(client: Arc<dyn ChatClient>, settings: AnalysisSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Extracts readings of one category, adding the call's token usage to `usage`.
    pub async fn parse(
        &self,
        text: &str,
        category: Option<Category>,
        laboratory: Laboratory,
        usage: &mut UsageSummary,
    ) -> GenerativeOutcome {
        let reordered = reorder_unit_first_rows(text);
        let input = pricing::truncate_to_tokens(&reordered, self.settings.max_input_tokens);

        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::system_prompt(category, laboratory)),
                ChatMessage::user(prompts::user_message(input)),
            ],
            max_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
            response_format: ResponseFormat::json_object(),
        };

        let label = category.map(|c| c.as_str()).unwrap_or("generic");
        let completion = match self.client.complete(&request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!("Generative extraction for {} failed: {}", label, e);
                return GenerativeOutcome::Failure(e);
            }
        };

        let cost = pricing::estimate_cost(&self.settings.model, completion.prompt_tokens, completion.completion_tokens);
        usage.record(completion.prompt_tokens, completion.completion_tokens, cost);
        info!(
            "Generative call for {}: model={}, prompt_tokens={}, completion_tokens={}, cost=${:.6}",
            label, self.settings.model, completion.prompt_tokens, completion.completion_tokens, cost
        );

        match parse_response(&completion.content) {
            Ok(readings) if readings.is_empty() => {
                info!("Generative extraction for {} returned no parameters", label);
                GenerativeOutcome::Empty
            }
            Ok(readings) => {
                debug!("Generative extraction for {} returned {} parameters", label, readings.len());
                GenerativeOutcome::Data(readings)
            }
            Err(e) => {
                warn!("Generative response for {} rejected: {}", label, e);
                GenerativeOutcome::Failure(e)
            }
        }
    }
}

/// Models occasionally wrap JSON mode output in a markdown fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Converts `{"parameters": {key: {value, unit, reference, status}}}` into readings keyed
/// by canonical parameter key. Entries without a usable value are skipped.
pub fn parse_response(content: &str) -> Result<ReadingMap, GenerativeError> {
    let root: Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| GenerativeError::InvalidResponse(e.to_string()))?;
    let root = root
        .as_object()
        .ok_or_else(|| GenerativeError::InvalidResponse("top level is not an object".to_string()))?;

    let Some(parameters) = root.get("parameters") else {
        return Ok(ReadingMap::new());
    };
    let parameters = parameters
        .as_object()
        .ok_or_else(|| GenerativeError::InvalidResponse("`parameters` is not an object".to_string()))?;

    let mut readings = ReadingMap::new();
    for (raw_key, entry) in parameters {
        let key = knowledge::canonical_key(raw_key)
            .map(str::to_string)
            .unwrap_or_else(|| knowledge::normalize_alias(raw_key));
        if readings.contains_key(&key) {
            continue;
        }
        match reading_from_entry(&key, entry) {
            Some(reading) => {
                readings.insert(key, reading);
            }
            None => debug!("Skipping generative entry {} without a numeric value", raw_key),
        }
    }
    Ok(readings)
}

fn reading_from_entry(key: &str, entry: &Value) -> Option<ExtractedReading> {
    let empty = Map::new();
    // A bare number is accepted as the value with nothing else known.
    let (fields, bare) = match entry {
        Value::Object(fields) => (fields, None),
        other => (&empty, Some(other)),
    };

    let (operator, value) = match bare.or_else(|| fields.get("value"))? {
        Value::Number(n) => (None, n.as_f64()?),
        Value::String(s) => parse_value_with_operator(s)?,
        _ => return None,
    };

    let unit = fields
        .get("unit")
        .and_then(Value::as_str)
        .map(units::normalize)
        .unwrap_or_default();
    let reference = match fields.get("reference") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let status = if !knowledge::is_plausible(key, value) {
        warn!("Generative value {} for {} is outside the plausible range", value, key);
        ReadingStatus::Unknown
    } else {
        fields
            .get("status")
            .and_then(Value::as_str)
            .and_then(ReadingStatus::from_label)
            .filter(|s| *s != ReadingStatus::Unknown)
            .or_else(|| parse_reference(&reference).map(|r| r.status_for(value, false)))
            .unwrap_or(ReadingStatus::Unknown)
    };

    Some(ExtractedReading {
        value,
        operator,
        unit,
        reference,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::ChatCompletion;
    use crate::models::Comparison;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Mutex<Option<Result<ChatCompletion, GenerativeError>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn replying(content: &str) -> Self {
            Self {
                reply: Mutex::new(Some(Ok(ChatCompletion {
                    content: content.to_string(),
                    prompt_tokens: 1000,
                    completion_tokens: 200,
                }))),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: GenerativeError) -> Self {
            Self {
                reply: Mutex::new(Some(Err(error))),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, GenerativeError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(GenerativeError::InvalidResponse("no scripted reply".into())))
        }
    }

    #[test]
    fn test_parse_response_canonicalizes() {
        let content = r#"{"parameters": {
            "HGB": {"value": 145, "unit": "g/l", "reference": "130-160", "status": "normal"},
            "wbc": {"value": "11,2", "unit": "10^9/L", "reference": "4.0 - 9.0", "status": ""},
            "CRP": {"value": "< 0.5", "unit": "mg/l", "reference": "0-5"},
            "mystery_marker": {"value": 3.3, "unit": "", "reference": ""},
            "note": {"value": "не обнаружено"}
        }}"#;
        let readings = parse_response(content).unwrap();

        let hgb = &readings["hemoglobin"];
        assert_eq!(hgb.value, 145.0);
        assert_eq!(hgb.status, ReadingStatus::Normal);

        let wbc = &readings["leukocytes"];
        assert_eq!(wbc.value, 11.2);
        assert_eq!(wbc.status, ReadingStatus::Elevated);

        let crp = &readings["crp"];
        assert_eq!(crp.operator, Some(Comparison::Less));
        assert_eq!(crp.status, ReadingStatus::Normal);

        assert_eq!(readings["mystery_marker"].status, ReadingStatus::Unknown);
        assert!(!readings.contains_key("note"));
    }

    #[test]
    fn test_implausible_value_kept_as_unknown() {
        let readings = parse_response(r#"{"parameters": {"hemoglobin": {"value": 1450, "status": "high"}}}"#).unwrap();
        assert_eq!(readings["hemoglobin"].value, 1450.0);
        assert_eq!(readings["hemoglobin"].status, ReadingStatus::Unknown);
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(matches!(parse_response("not json"), Err(GenerativeError::InvalidResponse(_))));
        assert!(matches!(parse_response("[1, 2]"), Err(GenerativeError::InvalidResponse(_))));
        assert!(parse_response("{}").unwrap().is_empty());
        assert!(parse_response("```json\n{\"parameters\": {\"tsh\": {\"value\": 2.1}}}\n```")
            .unwrap()
            .contains_key("tsh"));
    }

    #[tokio::test]
    async fn test_parse_records_usage_and_builds_request() {
        let client = Arc::new(ScriptedClient::replying(r#"{"parameters": {"tsh": {"value": 2.1, "unit": "мМЕ/л"}}}"#));
        let extractor = GenerativeExtractor::new(client.clone(), AnalysisSettings::default());
        let mut usage = UsageSummary::new("gpt-4o-mini");

        let outcome = extractor
            .parse("ТТГ 2.1", Some(Category::Hormones), Laboratory::Invitro, &mut usage)
            .await;
        match outcome {
            GenerativeOutcome::Data(readings) => assert_eq!(readings["tsh"].value, 2.1),
            other => panic!("unexpected outcome {:?}", other),
        }

        assert_eq!(usage.calls, 1);
        assert_eq!(usage.prompt_tokens, 1000);
        assert!(usage.cost_usd > 0.0);

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].messages[0].role, "system");
        assert!(seen[0].messages[0].content.contains("ИНВИТРО"));
        assert!(seen[0].messages[1].content.ends_with("ТТГ 2.1"));
    }

    #[tokio::test]
    async fn test_empty_and_failure_outcomes() {
        let mut usage = UsageSummary::new("gpt-4o-mini");

        let empty = GenerativeExtractor::new(
            Arc::new(ScriptedClient::replying(r#"{"parameters": {}}"#)),
            AnalysisSettings::default(),
        );
        let outcome = empty.parse("text", Some(Category::BloodGeneral), Laboratory::Unknown, &mut usage).await;
        assert!(matches!(outcome, GenerativeOutcome::Empty));

        let failing = GenerativeExtractor::new(
            Arc::new(ScriptedClient::failing(GenerativeError::MissingCredential)),
            AnalysisSettings::default(),
        );
        let outcome = failing.parse("text", Some(Category::BloodGeneral), Laboratory::Unknown, &mut usage).await;
        assert!(matches!(outcome, GenerativeOutcome::Failure(GenerativeError::MissingCredential)));
        assert_eq!(usage.calls, 1);
    }
}
