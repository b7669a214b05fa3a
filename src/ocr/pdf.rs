use image::DynamicImage;

use crate::ocr::error::OcrError;

#[cfg(feature = "pdf")]
use image::RgbaImage;
#[cfg(feature = "pdf")]
use pdfium_render::prelude::*;
#[cfg(feature = "pdf")]
use tracing::debug;

const POINTS_PER_INCH: f32 = 72.0;
const MAX_RENDER_DIMENSION: u32 = 8000;

/// One PDF page: its embedded text layer and, when that layer is too thin to trust,
/// a raster of the page for recognition.
#[derive(Debug, Clone)]
pub struct PdfPageContent {
    pub index: usize,
    pub text: String,
    pub raster: Option<DynamicImage>,
}

pub trait PdfSource: Send + Sync {
    /// Reads every page in order, rasterizing those whose text layer is shorter than
    /// `min_text_chars` non-whitespace characters.
    fn extract_pages(&self, bytes: &[u8], min_text_chars: usize, dpi: u32) -> Result<Vec<PdfPageContent>, OcrError>;
}

pub fn text_layer_is_sparse(text: &str, min_text_chars: usize) -> bool {
    text.chars().filter(|c| !c.is_whitespace()).count() < min_text_chars
}

/// Pixel size for a page of the given size in points, capped on the longer side.
pub fn render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let width = (width_points * scale).max(1.0);
    let height = (height_points * scale).max(1.0);

    let longest = width.max(height);
    if longest > MAX_RENDER_DIMENSION as f32 {
        let ratio = MAX_RENDER_DIMENSION as f32 / longest;
        (((width * ratio) as u32).max(1), ((height * ratio) as u32).max(1))
    } else {
        (width as u32, height as u32)
    }
}

/// PDFium-backed page reader. The library is bound per document since `Pdfium`
/// handles cannot cross threads.
#[cfg(feature = "pdf")]
pub struct PdfiumSource;

#[cfg(feature = "pdf")]
impl PdfiumSource {
    pub fn new() -> Result<Self, OcrError> {
        let _ = bind_pdfium()?;
        Ok(Self)
    }
}

#[cfg(feature = "pdf")]
fn bind_pdfium() -> Result<Pdfium, OcrError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| OcrError::Pdf {
            page: 0,
            details: format!("failed to load PDFium from {}: {}", path, e),
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| OcrError::Pdf {
        page: 0,
        details: format!("PDFium library not found, set PDFIUM_DYNAMIC_LIB_PATH: {}", e),
    })?;
    Ok(Pdfium::new(bindings))
}

#[cfg(feature = "pdf")]
impl PdfSource for PdfiumSource {
    fn extract_pages(&self, bytes: &[u8], min_text_chars: usize, dpi: u32) -> Result<Vec<PdfPageContent>, OcrError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| OcrError::Pdf {
                page: 0,
                details: format!("failed to open document: {}", e),
            })?;

        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map(|t| t.all())
                .map_err(|e| OcrError::Pdf {
                    page: index + 1,
                    details: format!("text layer unreadable: {}", e),
                })?;

            let raster = if text_layer_is_sparse(&text, min_text_chars) {
                let (width, height) = render_dimensions(page.width().value, page.height().value, dpi);
                let config = PdfRenderConfig::new()
                    .set_target_width(width as i32)
                    .set_maximum_height(height as i32);
                let bitmap = page.render_with_config(&config).map_err(|e| OcrError::Pdf {
                    page: index + 1,
                    details: format!("render failed: {}", e),
                })?;

                let rgba = RgbaImage::from_raw(bitmap.width() as u32, bitmap.height() as u32, bitmap.as_rgba_bytes())
                    .ok_or_else(|| OcrError::Pdf {
                        page: index + 1,
                        details: "bitmap size does not match its buffer".to_string(),
                    })?;
                debug!("Rendered page {} at {}x{}", index + 1, rgba.width(), rgba.height());
                Some(DynamicImage::ImageRgba8(rgba))
            } else {
                None
            };

            pages.push(PdfPageContent { index, text, raster });
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_text_floor() {
        assert!(text_layer_is_sparse("", 100));
        assert!(text_layer_is_sparse("  Стр. 1  \n\n", 100));
        let dense = "Гемоглобин 145 г/л ".repeat(10);
        assert!(!text_layer_is_sparse(&dense, 100));
    }

    #[test]
    fn test_render_dimensions() {
        // A4 in points
        assert_eq!(render_dimensions(595.0, 842.0, 300), (2479, 3508));
        let (w, h) = render_dimensions(5000.0, 2500.0, 300);
        assert!(w <= MAX_RENDER_DIMENSION && w >= MAX_RENDER_DIMENSION - 1);
        assert!((w as i64 - 2 * h as i64).abs() <= 2);
    }
}
