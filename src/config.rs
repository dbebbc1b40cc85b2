use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DiaglotError, Result};

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_in_flight() -> usize {
    4
}

fn default_max_retries() -> u32 {
    2
}

fn default_sample_limit() -> usize {
    crate::extract::DEFAULT_SAMPLE_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Two-letter target language codes, e.g. ["de", "fr", "it"]
    pub languages: Vec<String>,
    /// Where translated files are written
    pub output_dir: String,
    /// Fallback source language when per-page detection fails
    pub source_lang: String,
    /// Whether existing label_xx / label-xx attributes are overwritten
    pub overwrite_existing: bool,
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Backend engine
    pub engine: TranslatorEngine,
    /// Service base URL
    pub endpoint: String,
    /// API key, required for DeepL and for keyed LibreTranslate instances
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cap on concurrent in-flight translation calls
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Bounded retries before an attribute-level failure is recorded
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Optional HTTP(S) proxy URL
    #[serde(default)]
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TranslatorEngine {
    /// Self-hosted or public LibreTranslate instance
    LibreTranslate,
    /// DeepL API (free or pro endpoint)
    DeepL,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum number of text samples taken per page for detection
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_limit: default_sample_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: vec!["de".to_string(), "fr".to_string(), "it".to_string()],
            output_dir: "translated".to_string(),
            source_lang: "en".to_string(),
            overwrite_existing: true,
            translator: TranslatorConfig {
                engine: TranslatorEngine::LibreTranslate,
                endpoint: "http://localhost:5000".to_string(),
                api_key: None,
                timeout_secs: default_timeout_secs(),
                max_in_flight: default_max_in_flight(),
                max_retries: default_max_retries(),
                proxy: None,
            },
            detection: DetectionConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DiaglotError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| DiaglotError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DiaglotError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DiaglotError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(DiaglotError::Config(
                "languages must not be empty (e.g. [\"en\", \"de\", \"fr\"])".to_string(),
            ));
        }
        if self.source_lang.trim().is_empty() {
            return Err(DiaglotError::Config(
                "source_lang must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
