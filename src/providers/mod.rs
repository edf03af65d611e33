/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for:
 * - Google Translate: public web endpoint, source language "auto" supported
 * - LibreTranslate: self-hosted or public LibreTranslate server
 * - Mock: deterministic provider for tests and benchmarks
 */

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// A provider translates one piece of text per call. It may fail at any
/// call; `ProviderError::is_transient` tells the caller whether a retry
/// makes sense.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate `text` from `source_language` ("auto" to detect) to `target_language`
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Human readable provider name for logs
    fn name(&self) -> &str;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.translate("Hello", "auto", "fr").await.map(|_| ())
    }
}

/// Build the provider selected in the configuration
pub fn from_config(config: &TranslationConfig) -> Result<Arc<dyn Provider>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let endpoint = config.get_endpoint();

    let provider: Arc<dyn Provider> = match config.provider {
        TranslationProvider::Google => Arc::new(google::GoogleTranslate::new(&endpoint, timeout)?),
        TranslationProvider::LibreTranslate => Arc::new(libretranslate::LibreTranslate::new(
            &endpoint,
            &config.api_key,
            timeout,
        )?),
    };

    Ok(provider)
}

/// Map a reqwest failure onto the provider error taxonomy
pub(crate) fn classify_request_error(error: reqwest::Error) -> ProviderError {
    // Timeouts, refused connections and resets are all worth another attempt
    if error.is_decode() {
        ProviderError::Parse(error.to_string())
    } else {
        ProviderError::Transient(error.to_string())
    }
}

/// Map an unsuccessful HTTP status onto the provider error taxonomy
pub(crate) fn classify_status(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited(body),
        code => ProviderError::Http {
            status_code: code,
            message: body,
        },
    }
}

pub mod google;
pub mod libretranslate;
pub mod mock;
