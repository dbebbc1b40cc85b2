use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::config::TranslatorConfig;
use crate::error::{DiaglotError, Result};

/// Shared HTTP plumbing for translation backends: one client carrying the
/// configured timeout and proxy, a cap on in-flight calls, and bounded
/// retries before a failure is surfaced to the writer.
pub struct BackendClient {
    pub client: Client,
    pub config: TranslatorConfig,
    limiter: Semaphore,
}

impl BackendClient {
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| DiaglotError::Config(format!("invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| DiaglotError::Config(format!("failed to build HTTP client: {}", e)))?;
        let limiter = Semaphore::new(config.max_in_flight.max(1));

        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    /// Run one translation call under the in-flight cap, retrying up to the
    /// configured bound.
    pub async fn with_retries<F, Fut>(&self, call: F) -> Result<String>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| DiaglotError::Backend("translation limiter closed".to_string()))?;

        let mut attempt = 0;
        loop {
            match call().await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "translation attempt {}/{} failed, retrying: {}",
                        attempt,
                        self.config.max_retries + 1,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}
