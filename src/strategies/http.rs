//! HTTP lookup strategy.
//!
//! Fetches a JSON record from a profile endpoint. Typically first in the
//! chain: authoritative when the upstream service answers, and a clean
//! failure signal for the orchestrator to fall through on when it does
//! not.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::AcquisitionStrategy;
use crate::{MuninnError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Strategy that GETs `{base_url}/profiles/{identifier}` and
/// deserializes the JSON body into the record type.
pub struct HttpApiStrategy<T> {
    label: String,
    http: Client,
    base_url: String,
    api_key: Option<String>,
    confidence: f32,
    _record: PhantomData<fn() -> T>,
}

impl<T> HttpApiStrategy<T> {
    /// Create a strategy against the given base URL.
    ///
    /// Point `base_url` at a mock server (e.g. wiremock) for tests.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            label: "remote-api".to_string(),
            http,
            base_url: base_url.into(),
            api_key: None,
            confidence: 0.9,
            _record: PhantomData,
        }
    }

    /// Set a bearer token sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the source label (default: `"remote-api"`).
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Override the static confidence (default: 0.9).
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

#[async_trait]
impl<T> AcquisitionStrategy<T> for HttpApiStrategy<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    fn source(&self) -> &str {
        &self.label
    }

    fn confidence(&self) -> Option<f32> {
        Some(self.confidence)
    }

    async fn attempt(&self, identifier: &str) -> Result<T> {
        let url = format!("{}/profiles/{}", self.base_url, identifier);

        let mut request = self.http.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| MuninnError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MuninnError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MuninnError::Http(e.to_string()))
    }
}
