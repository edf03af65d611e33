use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{classify_request_error, classify_status, Provider};
use crate::errors::ProviderError;

/// Client for the public Google Translate web endpoint
#[derive(Debug)]
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Endpoint URL
    endpoint: Url,
}

impl GoogleTranslate {
    /// Create a new client
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| anyhow!("Invalid Google endpoint '{}': {}", endpoint, e))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, endpoint })
    }

    /// Extract the translated text from the nested array response
    ///
    /// The body looks like `[[["Bonjour","Hello",null,null,10], ...], null, "en", ...]`;
    /// long inputs come back as several sentence chunks that are concatenated.
    pub fn extract_text(body: &Value) -> Result<String, ProviderError> {
        let chunks = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Parse("missing sentence array".to_string()))?;

        let mut text = String::new();
        for chunk in chunks {
            if let Some(part) = chunk.get(0).and_then(Value::as_str) {
                text.push_str(part);
            }
        }

        Ok(text)
    }
}

#[async_trait]
impl Provider for GoogleTranslate {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        debug!("Google request: {} chars -> {}", text.len(), target_language);

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Google Translate error ({}): {}", status, body);
            return Err(classify_status(status, body));
        }

        let body: Value = response.json().await.map_err(classify_request_error)?;
        Self::extract_text(&body)
    }

    fn name(&self) -> &str {
        "Google Translate"
    }
}
