// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the vault API.
//!
//! Provides [`HttpTransport`], an [`ApiTransport`] over `reqwest`. It makes
//! exactly one attempt per request; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use ncrypt_config::model::ApiConfig;
use ncrypt_core::{ApiRequest, ApiResponse, ApiTransport, Method, NcryptError, RequestBody};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url` (e.g. `http://localhost:8000/api/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NcryptError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NcryptError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, NcryptError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, NcryptError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        if let Some(token) = &request.auth {
            let value = HeaderValue::from_str(&token.header_value()).map_err(|e| {
                NcryptError::Internal(format!("invalid authorization header value: {e}"))
            })?;
            builder = builder.header(AUTHORIZATION, value);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
        };

        let response = builder.send().await.map_err(|e| NcryptError::Transport {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| NcryptError::Transport {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        debug!(method = %request.method, path = %request.path, status, "api response");

        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) if !(200..300).contains(&status) => serde_json::Value::Null,
                Err(e) => {
                    return Err(NcryptError::Codec(format!(
                        "invalid response from server: {e}"
                    )));
                }
            }
        };

        ApiResponse { status, body }.error_for_status()
    }
}
