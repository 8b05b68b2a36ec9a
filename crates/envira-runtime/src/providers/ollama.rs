//! Ollama API Provider
//!
//! Implements the AIProvider trait for a local Ollama server using the
//! non-streaming `/api/generate` endpoint and `/api/tags` for model discovery.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{AIProvider, GenerateRequest, GenerateResponse, ProviderError};

pub const OLLAMA_API_BASE: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
/// Reply text used when Ollama answers without a `response` field.
pub const NO_RESPONSE: &str = "No response received";

const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const TAGS_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    pub default_model: String,
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(OLLAMA_API_BASE, DEFAULT_MODEL)
    }
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            default_model: default_model.into(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn get_model(&self, req: &GenerateRequest) -> String {
        req.model.clone().unwrap_or_else(|| self.default_model.clone())
    }

    async fn fetch_tags(&self, timeout: Duration) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(self.endpoint("/api/tags"))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// ============================================================================
// Ollama API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    done_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[async_trait]
impl AIProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, req: GenerateRequest) -> Result<GenerateResponse, ProviderError> {
        let model = self.get_model(&req);
        let body = OllamaGenerateRequest {
            model: &model,
            prompt: &req.prompt,
            stream: false,
            options: OllamaOptions {
                temperature: req.temperature,
                top_p: req.top_p,
                num_predict: req.max_tokens,
            },
        };

        debug!(model = %model, prompt_chars = req.prompt.len(), "sending generate request");

        let response = self
            .client
            .post(self.endpoint("/api/generate"))
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read body>".to_string());
            warn!(status = status.as_u16(), "ollama generate failed");
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(GenerateResponse {
            content: parsed.response.unwrap_or_else(|| NO_RESPONSE.to_string()),
            model: parsed.model.or(Some(model)),
            finish_reason: parsed.done_reason,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        self.fetch_tags(TAGS_TIMEOUT).await
    }

    async fn health_check(&self) -> bool {
        self.fetch_tags(HEALTH_TIMEOUT).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_creation_explicit() {
        let provider = OllamaProvider::new("http://gpu-box:11434", "deepseek-r1:1.5b");
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.default_model, "deepseek-r1:1.5b");
    }

    #[test]
    fn endpoint_building() {
        let provider = OllamaProvider::new("http://localhost:11434", DEFAULT_MODEL);
        assert_eq!(
            provider.endpoint("/api/generate"),
            "http://localhost:11434/api/generate"
        );

        let provider2 = OllamaProvider::new("http://localhost:11434/", DEFAULT_MODEL);
        assert_eq!(
            provider2.endpoint("/api/tags"),
            "http://localhost:11434/api/tags"
        );
    }

    #[test]
    fn get_model_uses_default_when_not_specified() {
        let provider = OllamaProvider::default();
        let req = GenerateRequest::new("test");
        assert_eq!(provider.get_model(&req), "llama3.2");
    }

    #[test]
    fn get_model_uses_request_model_when_specified() {
        let provider = OllamaProvider::default();
        let req = GenerateRequest::new("test").with_model("mistral");
        assert_eq!(provider.get_model(&req), "mistral");
    }

    #[test]
    fn request_body_matches_ollama_schema() {
        let body = OllamaGenerateRequest {
            model: "llama3.2",
            prompt: "hi",
            stream: false,
            options: OllamaOptions {
                temperature: Some(0.5),
                top_p: None,
                num_predict: None,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "llama3.2",
                "prompt": "hi",
                "stream": false,
                "options": { "temperature": 0.5 }
            })
        );
    }
}
