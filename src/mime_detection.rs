//! Input type detection for the recognition stage.
//!
//! Magic bytes decide first; the file extension is consulted only when the content
//! carries no recognizable signature.

use std::path::Path;
use tracing::{debug, warn};

use crate::ocr::error::OcrError;

const IMAGE_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/tiff",
    "image/bmp",
    "image/webp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
}

/// Method used for the decision, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    MagicBytes,
    Extension,
}

#[derive(Debug, Clone)]
pub struct MimeDetectionResult {
    pub mime_type: String,
    pub detection_method: DetectionMethod,
}

impl MimeDetectionResult {
    pub fn input_kind(&self) -> Option<InputKind> {
        kind_for_mime(&self.mime_type)
    }
}

pub fn kind_for_mime(mime_type: &str) -> Option<InputKind> {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_lowercase();
    match essence.as_str() {
        "application/pdf" => Some(InputKind::Pdf),
        // some platforms still report the pre-standard spellings
        "image/jpg" | "image/pjpeg" | "image/x-ms-bmp" => Some(InputKind::Image),
        other if IMAGE_MIME_TYPES.contains(&other) => Some(InputKind::Image),
        _ => None,
    }
}

/// Detects a MIME type from the first bytes of a file, falling back to its name.
pub fn detect_mime_from_content(content: &[u8], filename: &str) -> Option<MimeDetectionResult> {
    debug!("Detecting MIME type from content: filename={}, content_len={}", filename, content.len());

    if let Some(detected) = infer::get(content) {
        let mime_type = detected.mime_type().to_string();
        debug!("Magic bytes detected MIME type: {}", mime_type);
        return Some(MimeDetectionResult {
            mime_type,
            detection_method: DetectionMethod::MagicBytes,
        });
    }

    debug!("Content detection failed, falling back to extension detection");
    mime_guess::from_path(Path::new(filename))
        .first()
        .map(|mime| MimeDetectionResult {
            mime_type: mime.to_string(),
            detection_method: DetectionMethod::Extension,
        })
}

/// Reads the head of `path` and classifies it as a PDF or a raster image.
pub fn detect_input_kind(path: &Path) -> Result<InputKind, OcrError> {
    if !path.is_file() {
        return Err(OcrError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut head = vec![0u8; 8192];
    let read = {
        use std::io::Read;
        let mut file = std::fs::File::open(path)?;
        file.read(&mut head)?
    };
    head.truncate(read);

    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let detection = detect_mime_from_content(&head, filename);

    match detection.as_ref().and_then(MimeDetectionResult::input_kind) {
        Some(kind) => {
            debug!("Input {} classified as {:?} via {:?}", path.display(), kind, detection.as_ref().map(|d| d.detection_method));
            Ok(kind)
        }
        None => {
            let mime_type = detection
                .map(|d| d.mime_type)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            warn!("Rejecting {}: unsupported type {}", path.display(), mime_type);
            Err(OcrError::UnsupportedFileType {
                path: path.display().to_string(),
                mime_type,
            })
        }
    }
}
