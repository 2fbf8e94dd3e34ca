//! Completion gateway
//!
//! [`ResponseGateway`] turns one pending user question into exactly one
//! completion result or a classified [`GatewayError`]. All interaction with
//! the remote completion service goes through the [`ChatCompletions`] seam so
//! the gateway can be exercised against a stub in tests.
//!
//! Each request carries only the fixed system instruction and the question
//! being asked. Prior session turns are intentionally excluded: generation is
//! context-free per turn, and the transcript exists for display only.

mod xai;

pub use xai::{XaiClient, XaiConfig};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful and knowledgeable assistant. \
    Provide clear, accurate, and engaging responses.";

/// Model used when the configuration does not override it.
pub const DEFAULT_MODEL: &str = "grok-2-1212";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// One `{role, content}` entry in the outbound message list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Chat completion request body (OpenAI-compatible shape).
#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat completion response body.
#[derive(Debug, Deserialize)]
pub struct Completion {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// The completion-service seam. Implementations issue exactly one outbound
/// call per invocation; no retry, no caching.
#[async_trait]
pub trait ChatCompletions: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, GatewayError>;
}

/// Translates one user prompt into one completion result or a classified
/// failure. Stateless across calls; the underlying client handle is shared.
pub struct ResponseGateway {
    client: Arc<dyn ChatCompletions>,
    model: String,
}

impl ResponseGateway {
    pub fn new(client: Arc<dyn ChatCompletions>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Request a completion for `prompt`.
    ///
    /// Callers validate that `prompt` is non-blank before calling; a blank
    /// prompt reaching this point is a caller bug, not a [`GatewayError`].
    /// On failure nothing is retried and no state is kept; the caller decides
    /// how to surface the error.
    pub async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        debug_assert!(!prompt.trim().is_empty(), "blank prompt passed validation");

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let completion = self.client.complete(&request).await?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".into()))?;

        choice
            .message
            .content
            .ok_or_else(|| GatewayError::InvalidResponse("completion has no content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub that records the request it saw and returns a canned completion.
    struct StubCompletions {
        reply: String,
        calls: AtomicUsize,
    }

    impl StubCompletions {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatCompletions for StubCompletions {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.model, DEFAULT_MODEL);
            assert_eq!(request.messages.len(), 2);
            assert_eq!(request.messages[0].role, "system");
            assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
            assert_eq!(request.messages[1].role, "user");
            Ok(Completion {
                choices: vec![Choice {
                    message: ResponseMessage {
                        content: Some(self.reply.clone()),
                    },
                }],
            })
        }
    }

    struct FailingCompletions;

    #[async_trait]
    impl ChatCompletions for FailingCompletions {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, GatewayError> {
            Err(GatewayError::Api("connection reset by peer".into()))
        }
    }

    struct EmptyCompletions;

    #[async_trait]
    impl ChatCompletions for EmptyCompletions {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, GatewayError> {
            Ok(Completion { choices: vec![] })
        }
    }

    #[tokio::test]
    async fn generate_passes_content_through_unmodified() {
        let stub = Arc::new(StubCompletions::replying("Paris is the capital of France."));
        let gateway = ResponseGateway::new(stub.clone(), DEFAULT_MODEL);

        let answer = gateway
            .generate("What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(answer, "Paris is the capital of France.");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generate_makes_exactly_one_call_per_invocation() {
        let stub = Arc::new(StubCompletions::replying("ok"));
        let gateway = ResponseGateway::new(stub.clone(), DEFAULT_MODEL);

        gateway.generate("one").await.unwrap();
        gateway.generate("two").await.unwrap();

        assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_returned_not_raised() {
        let gateway = ResponseGateway::new(Arc::new(FailingCompletions), DEFAULT_MODEL);

        let err = gateway.generate("anything").await.unwrap_err();
        assert!(matches!(err, GatewayError::Api(_)));
    }

    #[tokio::test]
    async fn empty_choice_list_is_an_invalid_response() {
        let gateway = ResponseGateway::new(Arc::new(EmptyCompletions), DEFAULT_MODEL);

        let err = gateway.generate("anything").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[test]
    fn request_serializes_with_fixed_parameters() {
        let request = CompletionRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user("Hi")],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "grok-2-1212");
        let temperature = json["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn completion_parses_first_candidate() {
        let body = r#"{
            "choices": [
                { "message": { "role": "assistant", "content": "Hello!" } }
            ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 2 }
        }"#;

        let completion: Completion = serde_json::from_str(body).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("Hello!")
        );
    }
}
