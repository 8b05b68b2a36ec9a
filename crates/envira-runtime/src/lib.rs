//! Runtime abstractions for AI providers.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod providers;

pub use providers::OllamaProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.temperature = Some(temperature);
        self.top_p = Some(top_p);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub content: String,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The request never produced an HTTP response (refused, timed out, ...).
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("failed to decode provider response: {0}")]
    Decode(String),
    #[error("mock provider has no queued response")]
    MockQueueEmpty,
    #[error("provider error: {0}")]
    Message(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Decode(_) => "decode",
            Self::MockQueueEmpty => "mock_queue_empty",
            Self::Message(_) => "message",
        }
    }
}

#[async_trait]
pub trait AIProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, req: GenerateRequest) -> Result<GenerateResponse, ProviderError>;

    /// Names of the models the provider can serve.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;

    /// Whether the provider is reachable.
    async fn health_check(&self) -> bool {
        self.list_models().await.is_ok()
    }
}

/// Scripted provider for tests. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockProvider {
    generate_queue: Mutex<VecDeque<Result<GenerateResponse, ProviderError>>>,
    models: Mutex<Option<Result<Vec<String>, ProviderError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_generate(&self, result: Result<GenerateResponse, ProviderError>) {
        self.generate_queue
            .lock()
            .expect("mock generate queue poisoned")
            .push_back(result);
    }

    /// Queue a successful reply with `content`.
    pub fn enqueue_text(&self, content: impl Into<String>) {
        self.enqueue_generate(Ok(GenerateResponse {
            content: content.into(),
            model: None,
            finish_reason: Some("stop".to_string()),
        }));
    }

    pub fn set_models(&self, result: Result<Vec<String>, ProviderError>) {
        *self.models.lock().expect("mock models poisoned") = Some(result);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .clone()
    }
}

#[async_trait]
impl AIProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, req: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .push(req);
        self.generate_queue
            .lock()
            .expect("mock generate queue poisoned")
            .pop_front()
            .unwrap_or(Err(ProviderError::MockQueueEmpty))
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        self.models
            .lock()
            .expect("mock models poisoned")
            .clone()
            .unwrap_or(Err(ProviderError::MockQueueEmpty))
    }
}

#[cfg(test)]
mod tests {
    use super::{AIProvider, GenerateRequest, GenerateResponse, MockProvider, ProviderError};

    fn request() -> GenerateRequest {
        GenerateRequest::new("hello")
            .with_model("mock-1")
            .with_sampling(0.0, 1.0)
    }

    #[tokio::test]
    async fn mock_generate_returns_queued_response() {
        let provider = MockProvider::new();
        provider.enqueue_generate(Ok(GenerateResponse {
            content: "hello from mock".to_string(),
            model: Some("mock-1".to_string()),
            finish_reason: Some("stop".to_string()),
        }));

        let response = provider.generate(request()).await.unwrap();

        assert_eq!(response.content, "hello from mock");
        assert_eq!(response.model.as_deref(), Some("mock-1"));
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn mock_records_requests() {
        let provider = MockProvider::new();
        provider.enqueue_text("one");

        provider.generate(request()).await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "hello");
        assert_eq!(requests[0].model.as_deref(), Some("mock-1"));
    }

    #[tokio::test]
    async fn mock_reports_empty_queue_error() {
        let provider = MockProvider::new();

        let err = provider.generate(request()).await.unwrap_err();

        assert_eq!(err, ProviderError::MockQueueEmpty);
    }

    #[tokio::test]
    async fn mock_health_follows_model_listing() {
        let provider = MockProvider::new();
        assert!(!provider.health_check().await);

        provider.set_models(Ok(vec!["llama3.2".to_string()]));
        assert!(provider.health_check().await);
        assert_eq!(provider.list_models().await.unwrap(), vec!["llama3.2"]);
    }

    #[test]
    fn error_kinds_are_stable_labels() {
        assert_eq!(ProviderError::Transport("x".into()).kind(), "transport");
        assert_eq!(
            ProviderError::HttpStatus {
                status: 500,
                body: String::new()
            }
            .kind(),
            "http_status"
        );
    }
}
