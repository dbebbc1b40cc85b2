use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TranslationBackend;
use super::common::BackendClient;
use crate::config::TranslatorConfig;
use crate::error::{DiaglotError, Result};

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// LibreTranslate backend. Public instances are heavily rate-limited;
/// self-hosting is recommended.
pub struct LibreTranslateBackend {
    base: BackendClient,
}

impl LibreTranslateBackend {
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        Ok(Self {
            base: BackendClient::new(config)?,
        })
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = format!(
            "{}/translate",
            self.base.config.endpoint.trim_end_matches('/')
        );
        let request = LibreRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.base.config.api_key.as_deref(),
        };

        debug!("LibreTranslate request to {} ({} -> {})", url, source, target);

        let response = self
            .base
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DiaglotError::Backend(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DiaglotError::Backend(format!(
                "LibreTranslate error {}: {}",
                status, body
            )));
        }

        let parsed: LibreResponse = response
            .json()
            .await
            .map_err(|e| DiaglotError::Backend(format!("failed to parse response: {}", e)))?;

        let translated = parsed.translated_text.trim().to_string();
        if translated.is_empty() {
            return Err(DiaglotError::Backend(
                "empty translation received".to_string(),
            ));
        }
        Ok(translated)
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateBackend {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        self.base
            .with_retries(|| self.request(text, source, target))
            .await
    }
}
