//! Thin reqwest wrapper mapping transport failures onto [`AmegoError`].

use std::time::Duration;

use serde_json::Value;

use crate::core::AmegoError;

/// HTTP transport bound to one base URL.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AmegoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("amego-invoice/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AmegoError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// POST `fields` as `application/x-www-form-urlencoded`; returns the HTTP
    /// status and the decoded JSON body.
    pub async fn post_form(
        &self,
        endpoint: &str,
        fields: &[(&str, String)],
    ) -> Result<(u16, Value), AmegoError> {
        let result = self.client.post(self.url(endpoint)).form(fields).send().await;
        self.read_json(result).await
    }

    /// GET `endpoint`; returns the HTTP status and the decoded JSON body.
    pub async fn get_json(&self, endpoint: &str) -> Result<(u16, Value), AmegoError> {
        let result = self.client.get(self.url(endpoint)).send().await;
        self.read_json(result).await
    }

    async fn read_json(
        &self,
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<(u16, Value), AmegoError> {
        let resp = result.map_err(|e| self.map_transport_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_transport_error(e))?;

        let parsed = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            // An error status that still carries the vendor envelope is an API error.
            return match parsed {
                Ok(value) if value.get("code").is_some() => Ok((status.as_u16(), value)),
                _ => Err(AmegoError::Network(format!(
                    "HTTP {status}: {}",
                    truncate(&body, 200)
                ))),
            };
        }

        parsed
            .map(|value| (status.as_u16(), value))
            .map_err(|e| {
                AmegoError::InvalidResponse(format!("{e}: {}", truncate(&body, 200)))
            })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> AmegoError {
        if err.is_timeout() {
            AmegoError::Timeout {
                timeout: self.timeout,
            }
        } else if err.is_decode() {
            AmegoError::InvalidResponse(err.to_string())
        } else {
            AmegoError::Network(err.to_string())
        }
    }
}

fn truncate(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
