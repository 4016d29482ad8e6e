// src/llm/provider.rs
// LLM provider abstraction. One client is built at startup from config and
// shared by every chat request.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "openai/gpt-oss-120b";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "phi3.5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// Completion backend. Messages are passed in conversation order; callers
/// decide how much history to include.
#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, LLMError>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LLMConfig {
    /// Groq hosted inference, OpenAI-compatible API
    Groq {
        api_key: String,
        base_url: String,
        model: String,
        temperature: f32,
        timeout: Duration,
    },
    /// Local Ollama daemon
    Ollama {
        ollama_url: String,
        model: String,
        timeout: Duration,
    },
}

#[derive(Error, Debug, Clone)]
pub enum LLMError {
    #[error("LLM connection failed: {0}")]
    ConnectionFailed(String),
    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    ConfigError(String),
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LLMError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LLMError::ConfigError(format!("Cannot build HTTP client: {}", e)))
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, LLMError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LLMError::Api {
        status: status.as_u16(),
        body,
    })
}

// ---------------------------------------------------------------------------
// Groq (OpenAI-compatible /chat/completions)
// ---------------------------------------------------------------------------

pub struct GroqProvider {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Deserialize)]
struct ChatCompletionMessage {
    content: Option<String>,
}

impl GroqProvider {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, LLMError> {
        if api_key.trim().is_empty() {
            return Err(LLMError::ConfigError("GROQ_API_KEY is empty".to_string()));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature,
            client: build_http_client(timeout)?,
        })
    }
}

#[async_trait::async_trait]
impl LLMProvider for GroqProvider {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, LLMError> {
        let prompt_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        debug!(model = %self.model, messages = messages.len(), prompt_chars, "Requesting completion");

        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| LLMError::ConnectionFailed(e.to_string()))?;
        let response = error_for_status(response).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LLMError::InvalidResponse("response has no choices".to_string()))?;

        info!(model = %self.model, response_len = content.len(), "Completion received");
        Ok(content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Ollama (/api/chat)
// ---------------------------------------------------------------------------

pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String, timeout: Duration) -> Result<Self, LLMError> {
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            client: build_http_client(timeout)?,
        })
    }

    pub async fn health_check(&self) -> Result<(), LLMError> {
        let health_url = format!("{}/api/tags", self.url);
        self.client
            .get(&health_url)
            .send()
            .await
            .map_err(|e| {
                LLMError::ConnectionFailed(format!("Cannot reach Ollama at {}: {}", self.url, e))
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LLMProvider for OllamaProvider {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, LLMError> {
        debug!(model = %self.model, messages = messages.len(), "Requesting completion from Ollama");

        let url = format!("{}/api/chat", self.url);
        let req = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|e| LLMError::ConnectionFailed(e.to_string()))?;
        let response = error_for_status(response).await?;

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        info!(model = %self.model, response_len = parsed.message.content.len(), "Completion received");
        Ok(parsed.message.content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Builds the provider named by the config. Called once at startup.
pub async fn create_llm_provider(config: LLMConfig) -> Result<Arc<dyn LLMProvider>, LLMError> {
    match config {
        LLMConfig::Groq {
            api_key,
            base_url,
            model,
            temperature,
            timeout,
        } => {
            info!(%base_url, %model, "Initializing Groq provider");
            let provider = GroqProvider::new(base_url, api_key, model, temperature, timeout)?;
            Ok(Arc::new(provider))
        }
        LLMConfig::Ollama {
            ollama_url,
            model,
            timeout,
        } => {
            info!(%ollama_url, %model, "Initializing Ollama provider");
            let provider = OllamaProvider::new(ollama_url, model, timeout)?;
            provider.health_check().await.map_err(|e| {
                warn!("Failed to connect to Ollama. Make sure it's running: ollama serve");
                e
            })?;
            Ok(Arc::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_roles_serialize_lowercase() {
        let json = serde_json::to_value(PromptMessage::system("ctx")).unwrap();
        assert_eq!(json["role"], "system");
        let json = serde_json::to_value(PromptMessage::user("q")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_groq_provider_creation() {
        let provider = GroqProvider::new(
            format!("{}/", DEFAULT_GROQ_BASE_URL),
            "gsk_test".to_string(),
            DEFAULT_GROQ_MODEL.to_string(),
            DEFAULT_TEMPERATURE,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.model_name(), "openai/gpt-oss-120b");
        assert_eq!(provider.base_url, DEFAULT_GROQ_BASE_URL);
    }

    #[test]
    fn test_groq_rejects_empty_key() {
        let result = GroqProvider::new(
            DEFAULT_GROQ_BASE_URL.to_string(),
            "  ".to_string(),
            DEFAULT_GROQ_MODEL.to_string(),
            DEFAULT_TEMPERATURE,
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(LLMError::ConfigError(_))));
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![PromptMessage::system("s"), PromptMessage::user("u")];
        let body = serde_json::to_value(ChatCompletionRequest {
            model: "m",
            messages: &messages,
            temperature: 0.5,
        })
        .unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][1]["content"], "u");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LLMError::Api {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(format!("{}", err), "LLM API returned 429: rate limited");
    }
}
