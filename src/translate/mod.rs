// Translation backends behind one async trait.
//
// The engine is chosen by configuration through a factory:
// - LibreTranslate: self-hosted or public instance, optional API key
// - DeepL: official API, key required

pub mod common;
pub mod deepl;
pub mod libre;

use async_trait::async_trait;

pub use common::BackendClient;

use crate::config::{TranslatorConfig, TranslatorEngine};
use crate::error::Result;

/// A remote translation service. Calls are rate-limited and subject to the
/// configured timeout; a failure affects only the attribute being written.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate `text` from `source` into `target` (two-letter codes).
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Factory for creating backend instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_backend(config: TranslatorConfig) -> Result<Box<dyn TranslationBackend>> {
        Ok(match config.engine {
            TranslatorEngine::LibreTranslate => {
                Box::new(libre::LibreTranslateBackend::new(config)?)
            }
            TranslatorEngine::DeepL => Box::new(deepl::DeepLBackend::new(config)?),
        })
    }
}
