use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TranslationBackend;
use super::common::BackendClient;
use crate::config::TranslatorConfig;
use crate::error::{DiaglotError, Result};

#[derive(Debug, Serialize)]
struct DeepLRequest<'a> {
    text: [&'a str; 1],
    source_lang: String,
    target_lang: String,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// DeepL API backend. Works against both the free and pro endpoints; the
/// endpoint base (e.g. `https://api-free.deepl.com`) comes from configuration.
pub struct DeepLBackend {
    base: BackendClient,
    auth_key: String,
}

impl DeepLBackend {
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let auth_key = config
            .api_key
            .clone()
            .ok_or_else(|| DiaglotError::Config("DeepL requires an api_key".to_string()))?;
        Ok(Self {
            base: BackendClient::new(config)?,
            auth_key,
        })
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = format!(
            "{}/v2/translate",
            self.base.config.endpoint.trim_end_matches('/')
        );
        let request = DeepLRequest {
            text: [text],
            source_lang: source.to_uppercase(),
            target_lang: target.to_uppercase(),
        };

        debug!("DeepL request to {} ({} -> {})", url, source, target);

        let response = self
            .base
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("DeepL-Auth-Key {}", self.auth_key),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| DiaglotError::Backend(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DiaglotError::Backend(format!(
                "DeepL error {}: {}",
                status, body
            )));
        }

        let parsed: DeepLResponse = response
            .json()
            .await
            .map_err(|e| DiaglotError::Backend(format!("failed to parse response: {}", e)))?;

        let translated = parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.text.trim().to_string())
            .unwrap_or_default();
        if translated.is_empty() {
            return Err(DiaglotError::Backend(
                "empty translation received".to_string(),
            ));
        }
        Ok(translated)
    }
}

#[async_trait]
impl TranslationBackend for DeepLBackend {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        self.base
            .with_retries(|| self.request(text, source, target))
            .await
    }
}
