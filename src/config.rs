use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub llm_request_timeout_seconds: u64,
    pub ocr_languages: String,
    pub tessdata_prefix: Option<String>,
    pub pdf_min_page_text_chars: usize,
    pub pdf_render_dpi: u32,
    pub ocr_timeout_seconds: u64,
    pub save_debug_images: bool,
    pub debug_image_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com".to_string(),
            llm_request_timeout_seconds: 60,
            ocr_languages: "rus+eng".to_string(),
            tessdata_prefix: None,
            pdf_min_page_text_chars: 100,
            pdf_render_dpi: 300,
            ocr_timeout_seconds: 120,
            save_debug_images: false,
            debug_image_dir: PathBuf::from("./debug_images"),
            results_dir: PathBuf::from("./results"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        Ok(Config {
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            llm_request_timeout_seconds: parse_var("LLM_REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.llm_request_timeout_seconds),
            ocr_languages: env::var("OCR_LANGUAGES").unwrap_or(defaults.ocr_languages),
            tessdata_prefix: env::var("TESSDATA_PREFIX").ok(),
            pdf_min_page_text_chars: parse_var("PDF_MIN_PAGE_TEXT_CHARS")
                .unwrap_or(defaults.pdf_min_page_text_chars),
            pdf_render_dpi: parse_var("PDF_RENDER_DPI").unwrap_or(defaults.pdf_render_dpi),
            ocr_timeout_seconds: parse_var("OCR_TIMEOUT_SECONDS")
                .unwrap_or(defaults.ocr_timeout_seconds),
            save_debug_images: bool_var("SAVE_DEBUG_IMAGES").unwrap_or(defaults.save_debug_images),
            debug_image_dir: env::var("DEBUG_IMAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.debug_image_dir),
            results_dir: env::var("RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
        })
    }
}

/// Per-run administrative switches for the extraction stage.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisSettings {
    pub generative_enabled: bool,
    pub fallback_enabled: bool,
    pub model: String,
    pub max_input_tokens: usize,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            generative_enabled: true,
            fallback_enabled: true,
            model: "gpt-4o-mini".to_string(),
            max_input_tokens: 8000,
            max_output_tokens: 2000,
            temperature: 0.1,
        }
    }
}

impl AnalysisSettings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = AnalysisSettings::default();

        AnalysisSettings {
            generative_enabled: bool_var("GENERATIVE_ENABLED").unwrap_or(defaults.generative_enabled),
            fallback_enabled: bool_var("FALLBACK_ENABLED").unwrap_or(defaults.fallback_enabled),
            model: env::var("LLM_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model),
            max_input_tokens: parse_var("LLM_MAX_INPUT_TOKENS").unwrap_or(defaults.max_input_tokens),
            max_output_tokens: parse_var("LLM_MAX_OUTPUT_TOKENS").unwrap_or(defaults.max_output_tokens),
            temperature: parse_var("LLM_TEMPERATURE").unwrap_or(defaults.temperature),
        }
    }
}

/// Image preprocessing thresholds and stage toggles.
#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessSettings {
    pub target_dpi: u32,
    pub min_dpi: u32,
    pub max_dpi: u32,
    pub page_width_inches: f32,
    pub denoise_window: u32,
    pub max_skew_degrees: f32,
    pub skew_dead_zone_degrees: f32,
    pub denoise: bool,
    pub enhance_contrast: bool,
    pub deskew: bool,
    pub binarize: bool,
    pub morphology: bool,
    pub debug_dir: Option<PathBuf>,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        PreprocessSettings {
            target_dpi: 300,
            min_dpi: 200,
            max_dpi: 400,
            page_width_inches: 8.3,
            denoise_window: 3,
            max_skew_degrees: 10.0,
            skew_dead_zone_degrees: 0.3,
            denoise: true,
            enhance_contrast: true,
            deskew: true,
            binarize: true,
            morphology: true,
            debug_dir: None,
        }
    }
}

impl PreprocessSettings {
    pub fn from_config(config: &Config) -> Self {
        PreprocessSettings {
            debug_dir: config
                .save_debug_images
                .then(|| config.debug_image_dir.clone()),
            ..PreprocessSettings::default()
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn bool_var(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|s| match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // environment variables are process-global
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in ["LLM_MODEL", "LLM_MAX_INPUT_TOKENS", "GENERATIVE_ENABLED", "FALLBACK_ENABLED"] {
            env::remove_var(var);
        }
        let settings = AnalysisSettings::from_env();
        assert!(settings.generative_enabled);
        assert!(settings.fallback_enabled);
        assert_eq!(settings.max_input_tokens, 8000);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("LLM_MAX_INPUT_TOKENS", "lots");
        env::set_var("GENERATIVE_ENABLED", "off");
        env::set_var("PDF_RENDER_DPI", "-5");
        let settings = AnalysisSettings::from_env();
        let config = Config::from_env().unwrap();
        env::remove_var("LLM_MAX_INPUT_TOKENS");
        env::remove_var("GENERATIVE_ENABLED");
        env::remove_var("PDF_RENDER_DPI");

        assert_eq!(settings.max_input_tokens, 8000);
        assert!(!settings.generative_enabled);
        assert_eq!(config.pdf_render_dpi, 300);
    }

    #[test]
    fn test_debug_dir_follows_config() {
        let mut config = Config::default();
        assert_eq!(PreprocessSettings::from_config(&config).debug_dir, None);
        config.save_debug_images = true;
        assert_eq!(
            PreprocessSettings::from_config(&config).debug_dir,
            Some(PathBuf::from("./debug_images"))
        );
    }
}
