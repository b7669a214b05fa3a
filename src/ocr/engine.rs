use image::GrayImage;

use crate::knowledge::units;
use crate::ocr::error::OcrError;

#[cfg(feature = "ocr")]
use std::sync::Mutex;
#[cfg(feature = "ocr")]
use tesseract::{PageSegMode, Tesseract};
#[cfg(feature = "ocr")]
use tracing::{debug, info};

#[cfg(feature = "ocr")]
use crate::ocr::health::OcrHealthChecker;

/// Text recognition over an already preprocessed page.
///
/// Implementations are shared across jobs behind an `Arc` and must serialize access
/// to any model state themselves.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;
}

/// Joins wrapped lines back into their paragraph and drops blank lines.
///
/// A line continues the previous one when the previous line ends in a hyphen or the
/// line itself opens with a lowercase word. Unit-only lines stay on their own so the
/// unit-first row repair still sees them.
pub fn merge_paragraphs(raw: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if let Some(done) = current.take() {
                paragraphs.push(done);
            }
            continue;
        }

        current = Some(match current.take() {
            Some(mut previous) if previous.ends_with('-') => {
                previous.pop();
                previous.push_str(&line);
                previous
            }
            Some(mut previous) if is_continuation(&line) => {
                previous.push(' ');
                previous.push_str(&line);
                previous
            }
            Some(previous) => {
                paragraphs.push(previous);
                line
            }
            None => line,
        });
    }
    if let Some(done) = current {
        paragraphs.push(done);
    }

    paragraphs.join("\n")
}

fn is_continuation(line: &str) -> bool {
    let starts_lower = line.chars().next().is_some_and(|c| c.is_lowercase());
    starts_lower && !units::is_unit_line(line)
}

#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    languages: String,
    datapath: Option<String>,
    health: OcrHealthChecker,
    // built on first recognition, then reused
    instance: Mutex<Option<Tesseract>>,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    pub fn new(languages: impl Into<String>, datapath: Option<String>) -> Self {
        let languages = languages.into();
        Self {
            health: OcrHealthChecker::new(languages.clone()),
            languages,
            datapath,
            instance: Mutex::new(None),
        }
    }

    fn build(&self) -> Result<Tesseract, OcrError> {
        self.health.check_tesseract_installation()?;
        self.health.validate_cpu_requirements()?;
        if self.datapath.is_none() {
            self.health.validate_language_combination(&self.languages)?;
        }

        info!("Initializing Tesseract with languages {}", self.languages);
        let mut tesseract = Tesseract::new(self.datapath.as_deref(), Some(&self.languages))
            .map_err(|e| OcrError::InitializationFailed {
                details: e.to_string(),
            })?
            .set_variable("preserve_interword_spaces", "1")
            .map_err(|e| OcrError::InitializationFailed {
                details: e.to_string(),
            })?;
        tesseract.set_page_seg_mode(PageSegMode::PsmSingleBlock);
        Ok(tesseract)
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let (width, height) = image.dimensions();
        self.health.validate_memory_for_image(width, height)?;

        let mut slot = self.instance.lock().map_err(|_| OcrError::EngineUnavailable {
            details: "tesseract handle poisoned by an earlier panic".to_string(),
        })?;
        let tesseract = match slot.take() {
            Some(existing) => existing,
            None => self.build()?,
        };

        let mut tesseract = tesseract
            .set_frame(image.as_raw(), width as i32, height as i32, 1, width as i32)
            .map_err(|e| OcrError::RecognitionFailed {
                details: e.to_string(),
            })?;
        let text = tesseract.get_text().map_err(|e| OcrError::RecognitionFailed {
            details: e.to_string(),
        })?;
        *slot = Some(tesseract);

        debug!("Tesseract returned {} characters for {}x{}", text.len(), width, height);
        Ok(merge_paragraphs(&text))
    }
}

/// Stand-in used when the crate is built without the `ocr` feature.
#[cfg(not(feature = "ocr"))]
pub struct DisabledEngine;

#[cfg(not(feature = "ocr"))]
impl OcrEngine for DisabledEngine {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
        Err(OcrError::EngineUnavailable {
            details: "built without the `ocr` feature".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_stay_on_separate_lines() {
        let raw = "Гемоглобин 145 г/л 130 - 170\nЭритроциты 4.8 10^12/л\n\n";
        assert_eq!(
            merge_paragraphs(raw),
            "Гемоглобин 145 г/л 130 - 170\nЭритроциты 4.8 10^12/л"
        );
    }

    #[test]
    fn test_wrapped_names_are_joined() {
        let raw = "Средняя концентрация\nгемоглобина в эритроците 335\n\nСОЭ   12";
        assert_eq!(
            merge_paragraphs(raw),
            "Средняя концентрация гемоглобина в эритроците 335\nСОЭ 12"
        );

        let raw = "Тиреотроп-\nный гормон 2.1";
        assert_eq!(merge_paragraphs(raw), "Тиреотропный гормон 2.1");
    }

    #[test]
    fn test_unit_lines_are_not_joined() {
        let raw = "Гемоглобин\n145\nг/л";
        assert_eq!(merge_paragraphs(raw), "Гемоглобин\n145\nг/л");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(merge_paragraphs(""), "");
        assert_eq!(merge_paragraphs("\n  \n"), "");
    }
}
