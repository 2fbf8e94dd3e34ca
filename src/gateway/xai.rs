//! xAI (Grok) completion client
//!
//! Talks to the OpenAI-compatible `/chat/completions` endpoint at
//! `https://api.x.ai/v1`. Any server implementing the same format works by
//! overriding the base URL, which the tests use to point at a local stub.

use reqwest::Client;
use serde::Deserialize;

use super::{ChatCompletions, Completion, CompletionRequest, GatewayError};

/// Error response body returned by the API on non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Clone)]
pub struct XaiConfig {
    /// Base URL for the API.
    pub base_url: String,
    /// Bearer credential, injected from configuration at construction time.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl XaiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.x.ai/v1".to_string(),
            api_key: api_key.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Long-lived client handle; constructed once and reused across requests.
pub struct XaiClient {
    config: XaiConfig,
    client: Client,
}

impl XaiClient {
    pub fn new(config: XaiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self { config, client }
    }
}

#[async_trait::async_trait]
impl ChatCompletions for XaiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, GatewayError> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::InvalidResponse(format!("Failed to parse response: {e} - Body: {body}"))
        })
    }
}

fn classify_error(status: reqwest::StatusCode, body: &str) -> GatewayError {
    if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(body) {
        return GatewayError::Api(error_resp.error.message);
    }
    GatewayError::Api(format!("HTTP {status}: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_xai() {
        let config = XaiConfig::new("test-key");
        assert_eq!(config.base_url, "https://api.x.ai/v1");
        assert_eq!(config.api_key, "test-key");
    }

    #[test]
    fn base_url_override() {
        let config = XaiConfig::new("k").with_base_url("http://localhost:8000/v1");
        assert_eq!(config.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn structured_error_body_is_classified() {
        let body = r#"{"error":{"message":"Incorrect API key provided"}}"#;
        let err = classify_error(reqwest::StatusCode::UNAUTHORIZED, body);

        match err {
            GatewayError::Api(msg) => assert_eq!(msg, "Incorrect API key provided"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unstructured_error_body_keeps_status_and_text() {
        let err = classify_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");

        match err {
            GatewayError::Api(msg) => {
                assert!(msg.contains("502"));
                assert!(msg.contains("upstream down"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
