pub mod engine;
pub mod error;
pub mod health;
pub mod pdf;
pub mod preprocess;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::config::{Config, PreprocessSettings};
use crate::mime_detection::{detect_input_kind, InputKind};
use crate::ocr::engine::OcrEngine;
use crate::ocr::error::OcrError;
use crate::ocr::pdf::PdfSource;
use crate::ocr::preprocess::ImagePreprocessor;

/// File path to text: images go through preprocessing and recognition, PDFs use their
/// text layer and fall back to recognition page by page.
///
/// Cheap to clone; the engine and PDF reader are shared handles.
#[derive(Clone)]
pub struct OcrService {
    engine: Arc<dyn OcrEngine>,
    pdf: Option<Arc<dyn PdfSource>>,
    preprocessor: ImagePreprocessor,
    min_page_text_chars: usize,
    render_dpi: u32,
    timeout: Duration,
}

impl OcrService {
    pub fn new(
        engine: Arc<dyn OcrEngine>,
        pdf: Option<Arc<dyn PdfSource>>,
        preprocessor: ImagePreprocessor,
        config: &Config,
    ) -> Self {
        Self {
            engine,
            pdf,
            preprocessor,
            min_page_text_chars: config.pdf_min_page_text_chars,
            render_dpi: config.pdf_render_dpi,
            timeout: Duration::from_secs(config.ocr_timeout_seconds.max(1)),
        }
    }

    /// Wires the native backends the crate was built with.
    pub fn from_config(config: &Config, settings: PreprocessSettings) -> Self {
        Self::new(
            default_engine(config),
            default_pdf_source(),
            ImagePreprocessor::new(settings),
            config,
        )
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn extract_text(&self, path: &Path) -> Result<String, OcrError> {
        let kind = detect_input_kind(path)?;
        info!("Extracting text from {} ({:?})", path.display(), kind);

        let service = self.clone();
        let owned: PathBuf = path.to_path_buf();
        let job = tokio::task::spawn_blocking(move || service.extract_blocking(&owned, kind));

        match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(OcrError::Other(anyhow::anyhow!(
                "text extraction task failed: {}",
                join_error
            ))),
            Err(_) => {
                // The blocking task cannot be cancelled. It keeps the engine lock until
                // recognition returns, so later jobs on this service wait behind it.
                warn!("Text extraction for {} exceeded {:?}", path.display(), self.timeout);
                Err(OcrError::OcrTimeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }

    fn extract_blocking(&self, path: &Path, kind: InputKind) -> Result<String, OcrError> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();

        let text = match kind {
            InputKind::Image => {
                let img = ImagePreprocessor::load(path)?;
                self.recognize(&img, &name)?
            }
            InputKind::Pdf => self.extract_pdf(path, &name)?,
        };

        info!("Extracted {} characters from {}", text.chars().count(), path.display());
        Ok(text)
    }

    pub fn recognize(&self, img: &DynamicImage, name: &str) -> Result<String, OcrError> {
        let processed = self.preprocessor.process(img, name);
        self.engine.recognize(&processed)
    }

    fn extract_pdf(&self, path: &Path, name: &str) -> Result<String, OcrError> {
        let pdf = self.pdf.as_ref().ok_or_else(|| OcrError::Pdf {
            page: 0,
            details: "PDF support is not available in this build".to_string(),
        })?;

        let bytes = std::fs::read(path)?;
        let pages = pdf.extract_pages(&bytes, self.min_page_text_chars, self.render_dpi)?;
        debug!("{} has {} pages", path.display(), pages.len());

        let mut parts = Vec::with_capacity(pages.len());
        for page in &pages {
            let text = match &page.raster {
                Some(raster) => {
                    info!(
                        "Page {} text layer below {} characters, running OCR",
                        page.index + 1,
                        self.min_page_text_chars
                    );
                    self.recognize(raster, &format!("{}_page{}", name, page.index + 1))?
                }
                None => page.text.trim().to_string(),
            };
            if !text.is_empty() {
                parts.push(text);
            }
        }

        Ok(parts.join("\n"))
    }
}

#[cfg(feature = "ocr")]
pub fn default_engine(config: &Config) -> Arc<dyn OcrEngine> {
    Arc::new(engine::TesseractEngine::new(
        config.ocr_languages.clone(),
        config.tessdata_prefix.clone(),
    ))
}

#[cfg(not(feature = "ocr"))]
pub fn default_engine(_config: &Config) -> Arc<dyn OcrEngine> {
    Arc::new(engine::DisabledEngine)
}

#[cfg(feature = "pdf")]
pub fn default_pdf_source() -> Option<Arc<dyn PdfSource>> {
    match pdf::PdfiumSource::new() {
        Ok(source) => Some(Arc::new(source)),
        Err(e) => {
            warn!("PDF text extraction unavailable: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "pdf"))]
pub fn default_pdf_source() -> Option<Arc<dyn PdfSource>> {
    None
}
