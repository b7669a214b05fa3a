#![allow(dead_code)]

use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use labreader::config::{Config, PreprocessSettings};
use labreader::ocr::engine::OcrEngine;
use labreader::ocr::error::OcrError;
use labreader::ocr::pdf::{PdfPageContent, PdfSource};
use labreader::ocr::preprocess::ImagePreprocessor;
use labreader::ocr::OcrService;

/// Engine that returns canned text and remembers the size of every page it saw.
pub struct ScriptedEngine {
    pub text: String,
    pub delay: Option<Duration>,
    pub seen: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(text: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(text)
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.seen.lock().unwrap().push(image.dimensions());
        Ok(self.text.clone())
    }
}

/// PDF reader that hands back prepared pages regardless of the bytes.
pub struct StaticPdf {
    pub pages: Vec<PdfPageContent>,
}

impl PdfSource for StaticPdf {
    fn extract_pages(&self, _bytes: &[u8], _min_text_chars: usize, _dpi: u32) -> Result<Vec<PdfPageContent>, OcrError> {
        Ok(self.pages.clone())
    }
}

/// Preprocessing tuned so small synthetic pages are treated as 300 DPI scans.
pub fn test_preprocess_settings() -> PreprocessSettings {
    PreprocessSettings {
        page_width_inches: 1.0,
        ..PreprocessSettings::default()
    }
}

pub fn ocr_service(engine: Arc<dyn OcrEngine>, pdf: Option<Arc<dyn PdfSource>>, config: &Config) -> OcrService {
    OcrService::new(engine, pdf, ImagePreprocessor::new(test_preprocess_settings()), config)
}

/// White page with a few dark horizontal bars standing in for text rows.
pub fn text_like_page(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for row in 0..(height / 40) {
        let top = 20 + row * 40;
        for y in top..(top + 10).min(height) {
            for x in 20..(width - 20) {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
    }
    img
}

pub fn write_page(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    text_like_page(300, 240).save(&path).unwrap();
    path
}

pub fn gray_page() -> image::DynamicImage {
    image::DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 240, Luma([255])))
}
