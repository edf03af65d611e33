use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{classify_request_error, classify_status, Provider};
use crate::errors::ProviderError;
use crate::language_utils;

/// Client for a LibreTranslate server
#[derive(Debug)]
pub struct LibreTranslate {
    /// HTTP client for API requests
    client: Client,
    /// `/translate` URL
    url: Url,
    /// Optional API key
    api_key: Option<String>,
}

/// LibreTranslate request body
#[derive(Debug, Serialize)]
pub struct LibreRequest<'a> {
    q: &'a str,
    source: String,
    target: String,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// LibreTranslate response body
#[derive(Debug, Deserialize)]
pub struct LibreResponse {
    /// Translated text on success
    #[serde(rename = "translatedText")]
    pub translated_text: Option<String>,
    /// Error message on failure
    pub error: Option<String>,
}

impl LibreTranslate {
    /// Create a new client for the server at `endpoint`
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(endpoint).map_err(|e| anyhow!("Invalid LibreTranslate endpoint '{}': {}", endpoint, e))?;
        let url = base
            .join("translate")
            .map_err(|e| anyhow!("Invalid LibreTranslate endpoint '{}': {}", endpoint, e))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            url,
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
        })
    }
}

/// LibreTranslate only knows base codes (`zh`, not `zh-CN`)
fn libre_code(code: &str) -> String {
    if code.eq_ignore_ascii_case("auto") {
        "auto".to_string()
    } else {
        language_utils::base_code(code)
    }
}

#[async_trait]
impl Provider for LibreTranslate {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = LibreRequest {
            q: text,
            source: libre_code(source_language),
            target: libre_code(target_language),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("LibreTranslate error ({}): {}", status, body);
            return Err(classify_status(status, body));
        }

        let body: LibreResponse = response.json().await.map_err(classify_request_error)?;
        match (body.translated_text, body.error) {
            (Some(text), _) => Ok(text),
            (None, Some(message)) => Err(ProviderError::Rejected(message)),
            (None, None) => Err(ProviderError::Parse("response has no translatedText".to_string())),
        }
    }

    fn name(&self) -> &str {
        "LibreTranslate"
    }
}
