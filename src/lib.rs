pub mod analysis;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod mime_detection;
pub mod models;
pub mod ocr;
pub mod parser;
pub mod sink;

pub use analysis::{AnalysisError, AnalysisService, PipelineRun};
pub use config::{AnalysisSettings, Config, PreprocessSettings};
pub use models::{Category, ExtractedReading, GroupedResult, ParsingMethod, ReadingStatus};
