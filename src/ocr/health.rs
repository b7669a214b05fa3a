use crate::ocr::error::{CpuFeatures, OcrDiagnostics, OcrError};
use std::process::Command;
use sysinfo::System;

/// Probes the host for what the Tesseract path needs: the binary, language packs,
/// CPU instructions and memory headroom.
pub struct OcrHealthChecker {
    languages: String,
}

impl OcrHealthChecker {
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
        }
    }

    pub fn check_tesseract_installation(&self) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg("--version")
            .output()
            .map_err(|_| OcrError::TesseractNotInstalled)?;

        if !output.status.success() {
            return Err(OcrError::TesseractNotInstalled);
        }

        // older builds print the banner on stderr
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };

        Ok(banner
            .lines()
            .next()
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string()))
    }

    pub fn get_available_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = Command::new("tesseract")
            .arg("--list-langs")
            .output()
            .map_err(|_| OcrError::TesseractNotInstalled)?;

        if !output.status.success() {
            return Err(OcrError::TesseractNotInstalled);
        }

        Ok(parse_language_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Checks every member of a `rus+eng` style combination against the installed packs.
    pub fn validate_language_combination(&self, combination: &str) -> Result<(), OcrError> {
        let available = self.get_available_languages()?;
        check_combination(combination, &available)
    }

    pub fn check_cpu_features(&self) -> CpuFeatures {
        #[cfg(all(feature = "ocr", any(target_arch = "x86", target_arch = "x86_64")))]
        {
            use raw_cpuid::CpuId;
            let cpuid = CpuId::new();

            cpuid
                .get_feature_info()
                .map(|f| CpuFeatures {
                    sse2: f.has_sse2(),
                    sse4_1: f.has_sse41(),
                    avx: f.has_avx(),
                    avx2: cpuid
                        .get_extended_feature_info()
                        .map(|ef| ef.has_avx2())
                        .unwrap_or(false),
                })
                .unwrap_or_default()
        }

        #[cfg(not(all(feature = "ocr", any(target_arch = "x86", target_arch = "x86_64"))))]
        {
            CpuFeatures::default()
        }
    }

    pub fn validate_cpu_requirements(&self) -> Result<(), OcrError> {
        // cpuid probing is only wired up for x86 builds with the engine enabled
        if cfg!(not(all(feature = "ocr", any(target_arch = "x86", target_arch = "x86_64")))) {
            return Ok(());
        }
        if !self.check_cpu_features().sse2 {
            return Err(OcrError::MissingCpuInstruction {
                instruction: "SSE2".to_string(),
            });
        }
        Ok(())
    }

    pub fn check_memory_available(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.available_memory() / (1024 * 1024)
    }

    pub fn validate_memory_for_image(&self, width: u32, height: u32) -> Result<(), OcrError> {
        let required = estimate_memory_requirement(width, height);
        let available = self.check_memory_available();

        if required > available {
            return Err(OcrError::InsufficientMemory { required, available });
        }
        Ok(())
    }

    pub fn get_full_diagnostics(&self) -> OcrDiagnostics {
        OcrDiagnostics {
            tesseract_version: self.check_tesseract_installation().ok(),
            available_languages: self.get_available_languages().unwrap_or_default(),
            requested_languages: self.languages.clone(),
            cpu_features: self.check_cpu_features(),
            memory_available_mb: self.check_memory_available(),
        }
    }

    pub fn perform_full_health_check(&self) -> Result<OcrDiagnostics, Vec<OcrError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.check_tesseract_installation() {
            errors.push(e);
        }
        if let Err(e) = self.validate_cpu_requirements() {
            errors.push(e);
        }
        if errors.is_empty() {
            if let Err(e) = self.validate_language_combination(&self.languages) {
                errors.push(e);
            }
        }

        let diagnostics = self.get_full_diagnostics();
        if errors.is_empty() {
            Ok(diagnostics)
        } else {
            Err(errors)
        }
    }
}

/// 4 bytes per pixel across three working buffers, plus a fixed engine overhead.
pub fn estimate_memory_requirement(width: u32, height: u32) -> u64 {
    let pixels = (width as u64) * (height as u64);
    (pixels * 4 * 3) / (1024 * 1024) + 100
}

fn parse_language_listing(listing: &str) -> Vec<String> {
    let mut languages: Vec<String> = listing
        .lines()
        .skip(1) // "List of available languages in ..."
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    languages.sort();
    languages
}

fn check_combination(combination: &str, available: &[String]) -> Result<(), OcrError> {
    let languages: Vec<&str> = combination
        .split('+')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if languages.is_empty() {
        return Err(OcrError::LanguageDataNotFound {
            lang: "empty".to_string(),
        });
    }

    for lang in languages {
        if !available.iter().any(|a| a == lang) {
            return Err(OcrError::LanguageDataNotFound {
                lang: lang.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_listing() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nrus\nosd\n";
        assert_eq!(parse_language_listing(listing), vec!["eng", "osd", "rus"]);
    }

    #[test]
    fn test_check_combination() {
        let available = vec!["eng".to_string(), "rus".to_string()];
        assert!(check_combination("rus+eng", &available).is_ok());
        assert!(check_combination(" rus + eng ", &available).is_ok());

        match check_combination("rus+deu", &available) {
            Err(OcrError::LanguageDataNotFound { lang }) => assert_eq!(lang, "deu"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(check_combination("", &available).is_err());
    }

    #[test]
    fn test_memory_estimate() {
        assert_eq!(estimate_memory_requirement(0, 0), 100);
        // A4 at 300 dpi
        assert_eq!(estimate_memory_requirement(2480, 3508), 199);
    }
}
