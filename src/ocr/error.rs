use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Input file not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported input type '{mime_type}' for {path}. Expected a PDF or an image")]
    UnsupportedFileType { path: String, mime_type: String },

    #[error("Invalid image format or corrupted image: {details}")]
    InvalidImageFormat { details: String },

    #[error("Image too large for OCR. Max dimensions: {max_width}x{max_height}, Actual: {width}x{height}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("Insufficient memory for OCR operation. Required: {required}MB, Available: {available}MB")]
    InsufficientMemory { required: u64, available: u64 },

    #[error("Tesseract is not installed on the system")]
    TesseractNotInstalled,

    #[error("Tesseract language data not found for '{lang}'. Please install tesseract-ocr-{lang}")]
    LanguageDataNotFound { lang: String },

    #[error("CPU instruction set missing: {instruction}. Tesseract requires {instruction} support")]
    MissingCpuInstruction { instruction: String },

    #[error("OCR engine initialization failed: {details}")]
    InitializationFailed { details: String },

    #[error("Text recognition failed: {details}")]
    RecognitionFailed { details: String },

    #[error("OCR engine unavailable: {details}")]
    EngineUnavailable { details: String },

    #[error("PDF processing failed on page {page}: {details}")]
    Pdf { page: usize, details: String },

    #[error("OCR timeout after {seconds} seconds. Consider reducing image size or quality")]
    OcrTimeout { seconds: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OcrError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OcrError::InsufficientMemory { .. } | OcrError::OcrTimeout { .. }
        )
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            OcrError::TesseractNotInstalled
                | OcrError::LanguageDataNotFound { .. }
                | OcrError::MissingCpuInstruction { .. }
                | OcrError::EngineUnavailable { .. }
        )
    }

    /// Input problems abort the run and are reported straight to the caller.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            OcrError::FileNotFound { .. }
                | OcrError::UnsupportedFileType { .. }
                | OcrError::InvalidImageFormat { .. }
                | OcrError::ImageTooLarge { .. }
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OcrError::FileNotFound { .. } => "OCR_FILE_NOT_FOUND",
            OcrError::UnsupportedFileType { .. } => "OCR_UNSUPPORTED_TYPE",
            OcrError::InvalidImageFormat { .. } => "OCR_INVALID_FORMAT",
            OcrError::ImageTooLarge { .. } => "OCR_IMAGE_TOO_LARGE",
            OcrError::InsufficientMemory { .. } => "OCR_OUT_OF_MEMORY",
            OcrError::TesseractNotInstalled => "OCR_NOT_INSTALLED",
            OcrError::LanguageDataNotFound { .. } => "OCR_LANG_MISSING",
            OcrError::MissingCpuInstruction { .. } => "OCR_CPU_UNSUPPORTED",
            OcrError::InitializationFailed { .. } => "OCR_INIT_FAILED",
            OcrError::RecognitionFailed { .. } => "OCR_RECOGNITION_FAILED",
            OcrError::EngineUnavailable { .. } => "OCR_ENGINE_UNAVAILABLE",
            OcrError::Pdf { .. } => "OCR_PDF_ERROR",
            OcrError::OcrTimeout { .. } => "OCR_TIMEOUT",
            OcrError::Io(_) => "OCR_IO_ERROR",
            OcrError::Other(_) => "OCR_UNKNOWN_ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrDiagnostics {
    pub tesseract_version: Option<String>,
    pub available_languages: Vec<String>,
    pub requested_languages: String,
    pub cpu_features: CpuFeatures,
    pub memory_available_mb: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CpuFeatures {
    pub sse2: bool,
    pub sse4_1: bool,
    pub avx: bool,
    pub avx2: bool,
}

impl fmt::Display for OcrDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OCR Diagnostics:")?;
        writeln!(f, "  Tesseract Version: {}", self.tesseract_version.as_deref().unwrap_or("Not installed"))?;
        writeln!(f, "  Requested Languages: {}", self.requested_languages)?;
        writeln!(f, "  Available Languages: {}", self.available_languages.join(", "))?;
        writeln!(f, "  Memory Available: {} MB", self.memory_available_mb)?;
        writeln!(f, "  CPU Features:")?;
        writeln!(f, "    SSE2: {}", self.cpu_features.sse2)?;
        writeln!(f, "    SSE4.1: {}", self.cpu_features.sse4_1)?;
        writeln!(f, "    AVX: {}", self.cpu_features.avx)?;
        writeln!(f, "    AVX2: {}", self.cpu_features.avx2)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let missing = OcrError::FileNotFound { path: "/tmp/none.png".into() };
        assert!(missing.is_input_error());
        assert!(!missing.is_configuration_error());
        assert_eq!(missing.error_code(), "OCR_FILE_NOT_FOUND");

        let lang = OcrError::LanguageDataNotFound { lang: "rus".into() };
        assert!(lang.is_configuration_error());
        assert!(lang.to_string().contains("tesseract-ocr-rus"));

        assert!(OcrError::OcrTimeout { seconds: 5 }.is_recoverable());
    }
}
