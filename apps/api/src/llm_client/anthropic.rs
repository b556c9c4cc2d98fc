//! Secondary provider: Anthropic Messages API.
//!
//! This variant never sends system-role entries. System content is folded
//! into the first user turn, and JSON requests carry an explicit instruction
//! because the API has no JSON response mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ChatMessage, Completion, CompletionRequest, LlmError, LlmProvider, ModelClass, ModelPricing,
    Role, TokenUsage,
};
use crate::config::Config;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const JSON_SUFFIX: &str = "\n\nRespond only with valid JSON.";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    pricing: ModelPricing,
}

impl AnthropicClient {
    pub fn new(client: Client, api_key: String, config: &Config) -> Self {
        Self {
            client,
            api_key,
            base_url: ANTHROPIC_API_BASE.to_string(),
            model: config.anthropic_model.clone(),
            pricing: config.anthropic_pricing,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Converts a provider-neutral message list into Anthropic turns.
///
/// All system content is joined and prefixed onto the first user turn. If the
/// conversation opens with an assistant turn, the system content becomes a
/// leading user turn of its own so the list still starts with `user`.
fn shape_messages(messages: &[ChatMessage], json_output: bool) -> Vec<AnthropicMessage> {
    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut shaped: Vec<AnthropicMessage> = messages
        .iter()
        .filter_map(|m| match m.role {
            Role::System => None,
            Role::User => Some(AnthropicMessage {
                role: "user",
                content: m.content.clone(),
            }),
            Role::Assistant => Some(AnthropicMessage {
                role: "assistant",
                content: m.content.clone(),
            }),
        })
        .collect();

    if !system.is_empty() {
        let opens_with_user = shaped.first().is_some_and(|m| m.role == "user");
        if opens_with_user {
            shaped[0].content = format!("{system}\n\n{}", shaped[0].content);
        } else {
            shaped.insert(
                0,
                AnthropicMessage {
                    role: "user",
                    content: system,
                },
            );
        }
    }

    if json_output {
        if let Some(last_user) = shaped.iter_mut().rev().find(|m| m.role == "user") {
            last_user.content.push_str(JSON_SUFFIX);
        }
    }

    shaped
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model_for(&self, _class: ModelClass) -> &str {
        &self.model
    }

    fn pricing(&self) -> ModelPricing {
        self.pricing
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: shape_messages(&request.messages, request.json_output),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AnthropicResponse = response.json().await?;
        let text = parsed
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
            .map(|t| t.trim().to_string())
            .ok_or(LlmError::EmptyContent)?;

        debug!(
            "Anthropic call succeeded: input_tokens={}, output_tokens={}",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );

        Ok(Completion {
            text,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
            usage: TokenUsage {
                input: parsed.usage.input_tokens,
                output: parsed.usage.output_tokens,
                total: parsed.usage.input_tokens + parsed.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_system_content_is_merged_into_first_user_turn() {
        let shaped = shape_messages(
            &[
                ChatMessage::system("You represent the candidate."),
                ChatMessage::user("What did they build?"),
                ChatMessage::assistant("A clustering system."),
                ChatMessage::user("Where?"),
            ],
            false,
        );

        assert_eq!(shaped.len(), 3);
        assert!(shaped.iter().all(|m| m.role != "system"));
        assert_eq!(
            shaped[0].content,
            "You represent the candidate.\n\nWhat did they build?"
        );
        assert_eq!(shaped[2].content, "Where?");
    }

    #[test]
    fn test_assistant_first_conversation_gets_leading_user_turn() {
        let shaped = shape_messages(
            &[
                ChatMessage::system("sys"),
                ChatMessage::assistant("Hello!"),
                ChatMessage::user("hi"),
            ],
            false,
        );

        assert_eq!(shaped[0].role, "user");
        assert_eq!(shaped[0].content, "sys");
        assert_eq!(shaped[1].role, "assistant");
    }

    #[test]
    fn test_json_requests_append_instruction_to_last_user_turn() {
        let shaped = shape_messages(&[ChatMessage::user("classify")], true);
        assert_eq!(shaped[0].content, "classify\n\nRespond only with valid JSON.");
    }

    #[tokio::test]
    async fn test_request_headers_and_text_block_extraction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"model": "claude-sonnet-4-5", "max_tokens": 1000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Knock knock!\n"}],
                "usage": {"input_tokens": 40, "output_tokens": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnthropicClient::new(Client::new(), "sk-ant".to_string(), &Config::for_tests())
            .with_base_url(server.uri());
        let completion = client
            .complete(CompletionRequest::new(vec![ChatMessage::user("joke please")]))
            .await
            .unwrap();

        assert_eq!(completion.text, "Knock knock!");
        assert_eq!(completion.model, "claude-sonnet-4-5");
        assert_eq!(completion.usage.total, 42);
    }
}
