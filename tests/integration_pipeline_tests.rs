mod helpers;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use labreader::config::{AnalysisSettings, Config};
use labreader::llm::client::OpenAiClient;
use labreader::models::{Category, ParsingMethod};
use labreader::sink::{run_payload, JsonFileSink, ResultSink};
use labreader::AnalysisService;

use helpers::{ocr_service, write_page, ScriptedEngine};

const RECOGNIZED: &str = "Хеликс\n\
ТТГ 5.9* мкМЕ/мл 0.4 - 4.0\n\
Т4 свободный 14.1 пмоль/л 9.0 - 19.0\n\
Гемоглобин 138 г/л 120 - 160";

fn offline_service(engine: Arc<ScriptedEngine>) -> AnalysisService {
    // no key: the client refuses before touching the network
    let client = OpenAiClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
    AnalysisService::new(ocr_service(engine, None, &Config::default()), Arc::new(client))
}

#[tokio::test]
async fn test_document_run_is_hashed_grouped_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(dir.path(), "report.png");
    let service = offline_service(Arc::new(ScriptedEngine::new(RECOGNIZED)));

    let settings = AnalysisSettings {
        generative_enabled: false,
        ..AnalysisSettings::default()
    };
    let run = service.process_document(&path, &settings).await.unwrap();

    assert_eq!(run.sha256.len(), 64);
    assert_eq!(run.text_length, RECOGNIZED.chars().count());
    assert_eq!(run.result.metadata.parsing_method, ParsingMethod::Regex);
    assert_eq!(run.result.primary_type, Category::Hormones);
    assert_eq!(run.result.hormones["tsh"].value, 5.9);
    assert!(run.result.blood_general.contains_key("hemoglobin"));

    let results = dir.path().join("results");
    let sink = JsonFileSink::new(&results);
    sink.store(run.id, run_payload(&run).unwrap()).await.unwrap();

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(sink.path_for(run.id)).unwrap()).unwrap();
    assert_eq!(stored["result"]["primary_type"], "hormones");
    assert_eq!(stored["result"]["metadata"]["parsing_method"], "regex");
    assert_eq!(stored["result"]["metadata"]["laboratory"], "helix");
    assert_eq!(stored["result"]["hormones"]["tsh"]["status"], "повышен");
}

#[tokio::test]
async fn test_generative_failure_without_key_still_yields_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(dir.path(), "report.png");
    let service = offline_service(Arc::new(ScriptedEngine::new(RECOGNIZED)));

    let run = service.process_document(&path, &AnalysisSettings::default()).await.unwrap();
    assert_eq!(run.result.metadata.parsing_method, ParsingMethod::RegexFallback);
    assert!(run.result.total_parameters() >= 3);
}

#[tokio::test]
async fn test_missing_document_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let service = offline_service(Arc::new(ScriptedEngine::new(RECOGNIZED)));

    let err = service
        .process_document(&dir.path().join("absent.jpg"), &AnalysisSettings::default())
        .await
        .unwrap_err();
    assert!(err.is_input_error());
    assert_eq!(err.error_code(), "OCR_FILE_NOT_FOUND");
}

#[tokio::test]
async fn test_empty_text_gives_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_page(dir.path(), "blank.png");
    let service = offline_service(Arc::new(ScriptedEngine::new("")));

    let run = service.process_document(&path, &AnalysisSettings::default()).await.unwrap();
    assert_eq!(run.result.total_parameters(), 0);
    assert_eq!(run.result.primary_type, Category::BloodGeneral);
}
