//! Page image cleanup ahead of text recognition.
//!
//! Stages run in a fixed order: grayscale, DPI-driven resize, adaptive denoise,
//! local contrast enhancement, deskew, binarization and morphological cleanup.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::{
    contrast::{adaptive_threshold, otsu_level},
    edges::canny,
    filter::{bilateral_filter, gaussian_blur_f32},
    geometric_transformations::{rotate_about_center, Interpolation},
    hough::{detect_lines, LineDetectionOptions},
    morphology::{grayscale_close, grayscale_open, Mask},
};
use tracing::{debug, info, warn};

use crate::config::PreprocessSettings;
use crate::ocr::error::OcrError;

const MAX_DIMENSION: u32 = 20_000;
const HIGH_NOISE: f32 = 20.0;
const MEDIUM_NOISE: f32 = 10.0;
const CLAHE_CLIP_LIMIT: f32 = 2.0;
const CLAHE_GRID: u32 = 8;
const BINARIZE_BLOCK_RADIUS: u32 = 5;
const NLM_STRENGTH: f32 = 10.0;
const NLM_PATCH_RADIUS: usize = 3;
const NLM_SEARCH_RADIUS: i64 = 10;
/// `adaptive_threshold` sums into a `u32` integral image; above this a white page overflows it.
const ADAPTIVE_THRESHOLD_MAX_PIXELS: u64 = u32::MAX as u64 / 255;

#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    settings: PreprocessSettings,
}

impl ImagePreprocessor {
    pub fn new(settings: PreprocessSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PreprocessSettings {
        &self.settings
    }

    pub fn load(path: &Path) -> Result<DynamicImage, OcrError> {
        if !path.is_file() {
            return Err(OcrError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let img = image::open(path).map_err(|e| OcrError::InvalidImageFormat {
            details: format!("{}: {}", path.display(), e),
        })?;

        let (width, height) = img.dimensions();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(OcrError::ImageTooLarge {
                width,
                height,
                max_width: MAX_DIMENSION,
                max_height: MAX_DIMENSION,
            });
        }
        Ok(img)
    }

    pub fn process_path(&self, path: &Path) -> Result<GrayImage, OcrError> {
        let img = Self::load(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("page")
            .to_string();
        Ok(self.process(&img, &name))
    }

    /// Runs every enabled stage; `name` only labels debug snapshots.
    pub fn process(&self, img: &DynamicImage, name: &str) -> GrayImage {
        let (width, height) = img.dimensions();
        info!("Preprocessing {} ({}x{})", name, width, height);

        let gray = img.to_luma8();
        self.save_debug(&gray, name, "01_grayscale");

        let mut current = self.smart_resize(gray);
        self.save_debug(&current, name, "02_resized");

        if self.settings.denoise {
            current = self.adaptive_denoise(current);
            self.save_debug(&current, name, "03_denoised");
        }

        if self.settings.enhance_contrast {
            current = enhance_contrast(&current);
            self.save_debug(&current, name, "04_enhanced");
        }

        if self.settings.deskew {
            let angle = self.detect_skew(&current);
            if angle.abs() > self.settings.skew_dead_zone_degrees {
                debug!("Rotating by {:.2} degrees", angle);
                current = rotate_about_center(&current, -angle.to_radians(), Interpolation::Bicubic, Luma([255u8]));
            } else {
                debug!("No significant skew ({:.2} degrees)", angle);
            }
            self.save_debug(&current, name, "05_deskewed");
        }

        if self.settings.binarize {
            current = binarize(&current);
            self.save_debug(&current, name, "06_binary");

            if self.settings.morphology {
                current = morphological_cleanup(&current);
                self.save_debug(&current, name, "07_final");
            }
        }

        info!("Preprocessing complete: {}x{}", current.width(), current.height());
        current
    }

    pub fn estimate_dpi(&self, width: u32) -> f32 {
        width as f32 / self.settings.page_width_inches.max(0.1)
    }

    /// Rescales toward the target DPI when the estimate falls outside the accepted band.
    pub fn smart_resize(&self, img: GrayImage) -> GrayImage {
        let (width, height) = img.dimensions();
        let dpi = self.estimate_dpi(width);
        debug!("Estimated DPI: {:.0}", dpi);

        let filter = if dpi < self.settings.min_dpi as f32 {
            FilterType::Lanczos3
        } else if dpi > self.settings.max_dpi as f32 {
            FilterType::Triangle
        } else {
            return img;
        };

        let scale = self.settings.target_dpi as f32 / dpi;
        let new_width = ((width as f32 * scale) as u32).max(1);
        let new_height = ((height as f32 * scale) as u32).max(1);
        info!("Resizing {}x{} to {}x{} (estimated {:.0} dpi)", width, height, new_width, new_height, dpi);
        image::imageops::resize(&img, new_width, new_height, filter)
    }

    /// Median of the intensity standard deviation over non-overlapping blocks.
    ///
    /// Background dominates a printed page, so clean scans sit near zero while sensor
    /// noise lifts every block.
    pub fn estimate_noise(&self, img: &GrayImage) -> f32 {
        let block = self.settings.denoise_window.max(2);
        let (width, height) = img.dimensions();
        let mut deviations = Vec::new();

        for by in (0..height.saturating_sub(block - 1)).step_by(block as usize) {
            for bx in (0..width.saturating_sub(block - 1)).step_by(block as usize) {
                let mut sum = 0.0f32;
                let mut sum_sq = 0.0f32;
                for y in by..by + block {
                    for x in bx..bx + block {
                        let v = img.get_pixel(x, y)[0] as f32;
                        sum += v;
                        sum_sq += v * v;
                    }
                }
                let n = (block * block) as f32;
                let mean = sum / n;
                deviations.push((sum_sq / n - mean * mean).max(0.0).sqrt());
            }
        }

        if deviations.is_empty() {
            return 0.0;
        }
        deviations.sort_by(|a, b| a.total_cmp(b));
        deviations[deviations.len() / 2]
    }

    pub fn adaptive_denoise(&self, img: GrayImage) -> GrayImage {
        let noise = self.estimate_noise(&img);
        if noise > HIGH_NOISE {
            debug!("Noise level {:.1}: bilateral filter", noise);
            bilateral_filter(&img, 5, 50.0, 50.0)
        } else if noise > MEDIUM_NOISE {
            debug!("Noise level {:.1}: non-local means", noise);
            non_local_means(&img, NLM_STRENGTH)
        } else {
            debug!("Noise level {:.1}: skipping denoise", noise);
            img
        }
    }

    /// Median angle of near-horizontal Hough lines, in degrees.
    pub fn detect_skew(&self, img: &GrayImage) -> f32 {
        let edges = canny(img, 50.0, 150.0);
        let options = LineDetectionOptions {
            vote_threshold: 200,
            suppression_radius: 8,
        };

        let mut angles: Vec<f32> = detect_lines(&edges, options)
            .into_iter()
            .map(|line| line.angle_in_degrees as f32 - 90.0)
            .filter(|angle| angle.abs() < self.settings.max_skew_degrees)
            .collect();

        if angles.is_empty() {
            debug!("No near-horizontal lines detected");
            return 0.0;
        }

        angles.sort_by(|a, b| a.total_cmp(b));
        let mid = angles.len() / 2;
        let median = if angles.len() % 2 == 0 {
            (angles[mid - 1] + angles[mid]) / 2.0
        } else {
            angles[mid]
        };
        debug!("Detected {} lines, median skew {:.2} degrees", angles.len(), median);
        median
    }

    fn save_debug(&self, img: &GrayImage, name: &str, stage: &str) {
        let Some(dir) = &self.settings.debug_dir else {
            return;
        };
        let target = dir.join(format!("{}_{}.png", name, stage));
        let saved = std::fs::create_dir_all(dir)
            .map_err(|e| e.to_string())
            .and_then(|_| img.save(&target).map_err(|e| e.to_string()));
        if let Err(e) = saved {
            warn!("Failed to save debug image {}: {}", target.display(), e);
        }
    }
}

/// Tile-based histogram equalization with clipping, then an unsharp mask.
pub fn enhance_contrast(img: &GrayImage) -> GrayImage {
    let equalized = clahe(img, CLAHE_CLIP_LIMIT, CLAHE_GRID);
    let blurred = gaussian_blur_f32(&equalized, 1.0);

    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let e = equalized.get_pixel(x, y)[0] as f32;
        let b = blurred.get_pixel(x, y)[0] as f32;
        pixel[0] = (1.5 * e - 0.5 * b).round().clamp(0.0, 255.0) as u8;
    }
    out
}

fn clahe(img: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }
    let tiles_x = grid.min(width).max(1);
    let tiles_y = grid.min(height).max(1);
    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let area = ((x1.saturating_sub(x0)) * (y1.saturating_sub(y0))).max(1);

            let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            let bonus = excess / 256;
            let remainder = (excess % 256) as usize;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += bonus + u32::from(i < remainder);
            }

            let lut = &mut luts[(ty * tiles_x + tx) as usize];
            let mut cdf = 0u32;
            for (i, count) in hist.iter().enumerate() {
                cdf += count;
                lut[i] = ((cdf as f32 * 255.0 / area as f32).round()).min(255.0) as u8;
            }
        }
    }

    // bilinear blend between the four nearest tile mappings
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = gx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
        let ty0 = gy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let fx = (gx - tx0 as f32).clamp(0.0, 1.0);
        let fy = (gy - ty0 as f32).clamp(0.0, 1.0);

        let v = img.get_pixel(x, y)[0] as usize;
        let at = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][v] as f32;
        let top = at(tx0, ty0) * (1.0 - fx) + at(tx1, ty0) * fx;
        let bottom = at(tx0, ty1) * (1.0 - fx) + at(tx1, ty1) * fx;
        pixel[0] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Non-local means over a 7x7 patch and a 21x21 search window.
///
/// Each search offset is handled for the whole image at once: squared differences
/// are box-summed over the patch so every pixel gets its patch distance in one pass.
pub fn non_local_means(img: &GrayImage, h: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }
    let w = width as usize;
    let rows = height as usize;
    let pr = NLM_PATCH_RADIUS;
    let side = 2 * pr + 1;
    let padded_w = w + 2 * pr;
    let padded_h = rows + 2 * pr;

    let src = img.as_raw();
    let at = |x: i64, y: i64| -> i32 {
        let cx = x.clamp(0, w as i64 - 1) as usize;
        let cy = y.clamp(0, rows as i64 - 1) as usize;
        src[cy * w + cx] as i32
    };

    let inv_area_h2 = 1.0 / ((side * side) as f32 * h * h);
    let mut total = vec![0.0f32; w * rows];
    let mut norm = vec![0.0f32; w * rows];
    let mut diff = vec![0u32; padded_w * padded_h];
    let mut row_sums = vec![0u32; w * padded_h];

    for dy in -NLM_SEARCH_RADIUS..=NLM_SEARCH_RADIUS {
        for dx in -NLM_SEARCH_RADIUS..=NLM_SEARCH_RADIUS {
            for py in 0..padded_h {
                let y = py as i64 - pr as i64;
                for px in 0..padded_w {
                    let x = px as i64 - pr as i64;
                    let d = at(x, y) - at(x + dx, y + dy);
                    diff[py * padded_w + px] = (d * d) as u32;
                }
            }

            for py in 0..padded_h {
                let line = &diff[py * padded_w..(py + 1) * padded_w];
                let mut acc: u32 = line[..side].iter().sum();
                row_sums[py * w] = acc;
                for x in 1..w {
                    acc = acc + line[x + side - 1] - line[x - 1];
                    row_sums[py * w + x] = acc;
                }
            }

            for x in 0..w {
                let mut acc: u32 = (0..side).map(|py| row_sums[py * w + x]).sum();
                for y in 0..rows {
                    if y > 0 {
                        acc = acc + row_sums[(y + side - 1) * w + x] - row_sums[(y - 1) * w + x];
                    }
                    let weight = (-(acc as f32) * inv_area_h2).exp();
                    let i = y * w + x;
                    total[i] += weight * at(x as i64 + dx, y as i64 + dy) as f32;
                    norm[i] += weight;
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let i = y as usize * w + x as usize;
        Luma([(total[i] / norm[i]).round().clamp(0.0, 255.0) as u8])
    })
}

fn mean_intensity(img: &GrayImage) -> f32 {
    let count = (img.width() as u64 * img.height() as u64).max(1);
    let sum: u64 = img.pixels().map(|p| p[0] as u64).sum();
    sum as f32 / count as f32
}

/// Local threshold with a global Otsu fallback, normalized to dark ink on white.
pub fn binarize(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut binary = if width as u64 * height as u64 > ADAPTIVE_THRESHOLD_MAX_PIXELS {
        info!("Image too large for adaptive threshold ({}x{}), using Otsu", width, height);
        otsu_binarize(img)
    } else {
        let adaptive = adaptive_threshold(img, BINARIZE_BLOCK_RADIUS);
        let mean = mean_intensity(&adaptive);
        if (50.0..=200.0).contains(&mean) {
            adaptive
        } else {
            debug!("Adaptive threshold mean {:.1} out of range, using Otsu", mean);
            otsu_binarize(img)
        }
    };

    if mean_intensity(&binary) < 127.0 {
        debug!("Inverting dark background");
        image::imageops::invert(&mut binary);
    }
    binary
}

fn otsu_binarize(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    debug!("Otsu level {}", level);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Opening with a 2x2 block drops ink specks, then a 2x1 horizontal closing rejoins
/// strokes split by thresholding. Both act on the ink, so the page is inverted around them.
pub fn morphological_cleanup(img: &GrayImage) -> GrayImage {
    let square = Mask::from_image(&GrayImage::from_pixel(2, 2, Luma([255u8])), 1, 1);
    let horizontal = Mask::from_image(&GrayImage::from_pixel(2, 1, Luma([255u8])), 1, 0);

    let mut ink = img.clone();
    image::imageops::invert(&mut ink);
    let mut cleaned = grayscale_close(&grayscale_open(&ink, &square), &horizontal);
    image::imageops::invert(&mut cleaned);
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings_for_width(page_width_inches: f32) -> PreprocessSettings {
        PreprocessSettings {
            page_width_inches,
            ..PreprocessSettings::default()
        }
    }

    /// White page with horizontal black bars standing in for text lines.
    fn clean_page(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let in_bar = (20..170).contains(&x) && y % 24 >= 10 && y % 24 < 15;
            if in_bar {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    fn noisy_page(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let jitter = ((x * 7919 + y * 104_729) % 101) as i32 - 50;
            Luma([(128 + jitter).clamp(0, 255) as u8])
        })
    }

    #[test]
    fn test_resize_band() {
        let pre = ImagePreprocessor::new(settings_for_width(1.0));

        let same = pre.smart_resize(clean_page(300, 120));
        assert_eq!(same.dimensions(), (300, 120));

        let up = pre.smart_resize(clean_page(100, 50));
        assert_eq!(up.dimensions(), (300, 150));

        let down = pre.smart_resize(clean_page(1000, 200));
        assert_eq!(down.dimensions(), (300, 60));
    }

    #[test]
    fn test_noise_estimate_separates_clean_and_noisy() {
        let pre = ImagePreprocessor::new(PreprocessSettings::default());
        assert!(pre.estimate_noise(&clean_page(300, 240)) < 1.0);
        assert!(pre.estimate_noise(&noisy_page(300, 240)) > MEDIUM_NOISE);

        let clean = clean_page(300, 240);
        assert_eq!(pre.adaptive_denoise(clean.clone()), clean);
        let noisy = noisy_page(300, 240);
        assert_ne!(pre.adaptive_denoise(noisy.clone()), noisy);
    }

    #[test]
    fn test_skew_detected_on_tilted_lines() {
        let pre = ImagePreprocessor::new(PreprocessSettings::default());
        let slope = 3.0f32.to_radians().tan();
        let img = GrayImage::from_fn(700, 400, |x, y| {
            let on_line = [100.0f32, 200.0, 300.0].iter().any(|base| {
                let center = base + x as f32 * slope;
                (y as f32 - center).abs() < 2.0 && (50..650).contains(&x)
            });
            if on_line {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });

        let angle = pre.detect_skew(&img);
        assert!((angle.abs() - 3.0).abs() <= 1.0, "angle {}", angle);
        assert_eq!(pre.detect_skew(&clean_page(300, 240)), 0.0);
    }

    #[test]
    fn test_clean_upright_page_only_changes_by_binarization() {
        let page = DynamicImage::ImageLuma8(clean_page(300, 240));

        let full = ImagePreprocessor::new(settings_for_width(1.0)).process(&page, "page");
        let minimal = ImagePreprocessor::new(PreprocessSettings {
            denoise: false,
            deskew: false,
            ..settings_for_width(1.0)
        })
        .process(&page, "page");

        assert_eq!(full.dimensions(), (300, 240));
        assert_eq!(full, minimal);
    }

    #[test]
    fn test_binarized_output_is_two_tone_dark_on_light() {
        let pre = ImagePreprocessor::new(settings_for_width(1.0));
        let page = DynamicImage::ImageLuma8(clean_page(300, 240));
        let out = pre.process(&page, "page");
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert!(mean_intensity(&out) > 127.0);
    }

    #[test]
    fn test_inverted_page_is_flipped_to_dark_ink() {
        let mut negative = clean_page(300, 240);
        image::imageops::invert(&mut negative);
        let out = binarize(&negative);
        assert!(mean_intensity(&out) > 127.0);
    }

    #[test]
    fn test_morphology_drops_ink_specks_and_bridges_gaps() {
        // three-pixel-high stroke with a one-pixel break, plus a lone speck
        let mut img = GrayImage::from_fn(20, 20, |x, y| {
            if (8..11).contains(&y) && (2..18).contains(&x) && x != 10 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });
        img.put_pixel(4, 3, Luma([0u8]));

        let cleaned = morphological_cleanup(&img);
        assert_eq!(cleaned.get_pixel(4, 3)[0], 255);
        for x in 5..15 {
            assert_eq!(cleaned.get_pixel(x, 9)[0], 0, "stroke broken at x={}", x);
        }
    }

    #[test]
    fn test_medium_noise_uses_non_local_means() {
        let pre = ImagePreprocessor::new(PreprocessSettings::default());
        let img = GrayImage::from_fn(60, 60, |x, y| {
            let jitter = ((x * 7919 + y * 104_729) % 51) as i32 - 25;
            Luma([(128 + jitter) as u8])
        });
        let noise = pre.estimate_noise(&img);
        assert!(noise > MEDIUM_NOISE && noise <= HIGH_NOISE, "noise {}", noise);

        let denoised = pre.adaptive_denoise(img.clone());
        assert_eq!(denoised, non_local_means(&img, NLM_STRENGTH));
        assert!(pre.estimate_noise(&denoised) < noise);
    }

    #[test]
    fn test_flat_image_is_unchanged_by_non_local_means() {
        let flat = GrayImage::from_pixel(30, 30, Luma([200u8]));
        assert_eq!(non_local_means(&flat, NLM_STRENGTH), flat);
    }

    #[test]
    fn test_oversized_light_page_binarizes_with_otsu() {
        // resized phone screenshots land past the integral-image limit
        let (width, height) = (2490, 9222);
        assert!(width as u64 * height as u64 > ADAPTIVE_THRESHOLD_MAX_PIXELS);
        let img = GrayImage::from_fn(width, height, |_, y| {
            if y % 100 < 10 {
                Luma([20u8])
            } else {
                Luma([240u8])
            }
        });

        let out = binarize(&img);
        assert_eq!(out.dimensions(), (width, height));
        assert_eq!(out.get_pixel(100, 5)[0], 0);
        assert_eq!(out.get_pixel(100, 50)[0], 255);
    }

    #[test]
    fn test_debug_images_written() {
        let dir = TempDir::new().unwrap();
        let pre = ImagePreprocessor::new(PreprocessSettings {
            debug_dir: Some(dir.path().to_path_buf()),
            ..settings_for_width(1.0)
        });
        pre.process(&DynamicImage::ImageLuma8(clean_page(300, 240)), "sample");

        assert!(dir.path().join("sample_01_grayscale.png").exists());
        assert!(dir.path().join("sample_07_final.png").exists());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = ImagePreprocessor::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "OCR_INVALID_FORMAT");
    }
}
