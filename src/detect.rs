//! Language detection adapter.
//!
//! The detection primitive sits behind a trait so the pipeline can be tested
//! with a fixed detector. The default implementation wraps whatlang, which is
//! deterministic across runs on identical input, and refuses low-confidence
//! results so the pipeline's fallback policy kicks in instead of a guess.

use crate::error::{DiaglotError, Result};

/// Character cap applied to detection samples to reduce noise on huge pages.
pub const MAX_SAMPLE_CHARS: usize = 8000;

/// Minimum whatlang confidence accepted. Diagram labels are short, so the
/// stricter `is_reliable()` gate rejects almost everything real.
pub const MIN_CONFIDENCE: f64 = 0.5;

pub trait LanguageDetector: Send + Sync {
    /// Detect the dominant language of `sample` as a two-letter lowercase
    /// code. Fails on empty samples or low-confidence results.
    fn detect(&self, sample: &str) -> Result<String>;
}

/// Per-page outcome after the pipeline has applied its fallback policy.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub language: String,
    pub fallback: bool,
}

#[derive(Debug, Default)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, sample: &str) -> Result<String> {
        let trimmed = sample.trim();
        if trimmed.is_empty() {
            return Err(DiaglotError::Detection("empty sample".to_string()));
        }
        let capped: String = trimmed.chars().take(MAX_SAMPLE_CHARS).collect();
        let info = whatlang::detect(&capped)
            .ok_or_else(|| DiaglotError::Detection("no candidate language".to_string()))?;
        if info.confidence() < MIN_CONFIDENCE {
            return Err(DiaglotError::Detection(format!(
                "low confidence ({:.2}) for {:?}",
                info.confidence(),
                info.lang()
            )));
        }
        match lang_to_code(info.lang()) {
            Some(code) => Ok(code.to_string()),
            None => Err(DiaglotError::Detection(format!(
                "unsupported language {:?}",
                info.lang()
            ))),
        }
    }
}

/// Map whatlang's ISO 639-3 variants to the two-letter codes used in
/// translation attributes. Languages outside the table are `None`; feeding a
/// made-up code to a backend (and minting attributes for it) helps nobody.
fn lang_to_code(lang: whatlang::Lang) -> Option<&'static str> {
    use whatlang::Lang::*;
    Some(match lang {
        Eng => "en",
        Deu => "de",
        Fra => "fr",
        Ita => "it",
        Spa => "es",
        Por => "pt",
        Nld => "nl",
        Pol => "pl",
        Rus => "ru",
        Ukr => "uk",
        Cmn => "zh",
        Jpn => "ja",
        Kor => "ko",
        Ara => "ar",
        Hin => "hi",
        Tur => "tr",
        Vie => "vi",
        Tha => "th",
        Swe => "sv",
        Dan => "da",
        Fin => "fi",
        Ces => "cs",
        Hun => "hu",
        Ell => "el",
        Ron => "ro",
        _ => return None,
    })
}
