//! LLM Client: the single point of entry for all provider calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider HTTP API directly.
//! Components receive an `Option<&dyn LlmProvider>`; `None` means no
//! credential is configured and the component must take its fallback path.
//!
//! There is no retry loop. Each call is bounded by the HTTP client timeout and
//! a timeout is handled like any other provider failure.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::Config;

pub mod anthropic;
pub mod openai;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Which of a provider's models a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelClass {
    Standard,
    /// Cheap classification calls.
    Light,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model_class: ModelClass,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a single JSON object.
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model_class: ModelClass::Standard,
            temperature: 0.7,
            max_tokens: 1000,
            json_output: false,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn light(mut self) -> Self {
        self.model_class = ModelClass::Light;
        self
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
    pub total: u32,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Linear per-million-token pricing for one provider's model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn cost_usd(&self, usage: &TokenUsage) -> f64 {
        usage.input as f64 / 1_000_000.0 * self.input_per_million
            + usage.output as f64 / 1_000_000.0 * self.output_per_million
    }
}

/// One LLM provider. Variants own their request/response shaping.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model_for(&self, class: ModelClass) -> &str;

    fn pricing(&self) -> ModelPricing;

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}

/// Calls the provider and deserializes the text response as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn complete_json<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    request: CompletionRequest,
) -> Result<T, LlmError> {
    let completion = provider.complete(request.json()).await?;

    if completion.text.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }

    // Strip markdown code fences if the model wraps JSON in them
    let text = strip_json_fences(&completion.text);

    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Builds the HTTP client shared by both provider variants.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Picks the provider for this process: the primary (OpenAI) when its key is
/// set, otherwise the secondary (Anthropic), otherwise none.
pub fn select_provider(config: &Config, client: Client) -> Option<Arc<dyn LlmProvider>> {
    if let Some(key) = &config.openai_api_key {
        info!("LLM provider: openai (model: {})", config.openai_model);
        return Some(Arc::new(OpenAiClient::new(client, key.clone(), config)));
    }
    if let Some(key) = &config.anthropic_api_key {
        info!("LLM provider: anthropic (model: {})", config.anthropic_model);
        return Some(Arc::new(AnthropicClient::new(client, key.clone(), config)));
    }
    None
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::StubProvider;

    #[derive(Debug, Deserialize)]
    struct Probe {
        key: String,
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_pricing_is_linear_per_million() {
        let pricing = ModelPricing {
            input_per_million: 2.50,
            output_per_million: 10.00,
        };
        let usage = TokenUsage {
            input: 1_000_000,
            output: 500_000,
            total: 1_500_000,
        };
        assert!((pricing.cost_usd(&usage) - 7.50).abs() < 1e-9);
        assert_eq!(pricing.cost_usd(&TokenUsage::default()), 0.0);
    }

    #[test]
    fn test_select_provider_prefers_primary() {
        let mut config = Config::for_tests();
        config.openai_api_key = Some("sk-openai".to_string());
        config.anthropic_api_key = Some("sk-ant".to_string());
        let provider = select_provider(&config, Client::new()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_select_provider_uses_secondary_when_primary_absent() {
        let mut config = Config::for_tests();
        config.anthropic_api_key = Some("sk-ant".to_string());
        let provider = select_provider(&config, Client::new()).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_select_provider_none_without_credentials() {
        assert!(select_provider(&Config::for_tests(), Client::new()).is_none());
    }

    #[tokio::test]
    async fn test_complete_json_sets_json_flag_and_parses_fenced_body() {
        let stub = StubProvider::replying("```json\n{\"key\": \"value\"}\n```");
        let probe: Probe = complete_json(&stub, CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(probe.key, "value");
        assert!(stub.requests()[0].json_output);
    }

    #[tokio::test]
    async fn test_complete_json_rejects_blank_reply() {
        let stub = StubProvider::replying("   ");
        let result: Result<Probe, _> =
            complete_json(&stub, CompletionRequest::new(vec![ChatMessage::user("hi")])).await;
        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }
}
