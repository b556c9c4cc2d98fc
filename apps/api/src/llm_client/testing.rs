//! Provider double for unit tests. Records every request it receives.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{
    Completion, CompletionRequest, LlmError, LlmProvider, ModelClass, ModelPricing, TokenUsage,
};

pub struct StubProvider {
    text_reply: Result<String, u16>,
    json_reply: Option<Result<String, u16>>,
    text_delay: Duration,
    json_delay: Duration,
    usage: TokenUsage,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            text_reply: Ok(text.to_string()),
            json_reply: None,
            text_delay: Duration::ZERO,
            json_delay: Duration::ZERO,
            usage: TokenUsage::default(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an API error carrying `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            text_reply: Err(status),
            ..Self::replying("")
        }
    }

    /// Separate reply for requests with `json_output` set.
    pub fn with_json_reply(mut self, text: &str) -> Self {
        self.json_reply = Some(Ok(text.to_string()));
        self
    }

    pub fn with_delays(mut self, text_delay: Duration, json_delay: Duration) -> Self {
        self.text_delay = text_delay;
        self.json_delay = json_delay;
        self
    }

    pub fn with_usage(mut self, input: u32, output: u32) -> Self {
        self.usage = TokenUsage {
            input,
            output,
            total: input + output,
        };
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn model_for(&self, class: ModelClass) -> &str {
        match class {
            ModelClass::Standard => "stub-model",
            ModelClass::Light => "stub-model-light",
        }
    }

    fn pricing(&self) -> ModelPricing {
        ModelPricing {
            input_per_million: 2.50,
            output_per_million: 10.00,
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let (reply, delay) = match (&self.json_reply, request.json_output) {
            (Some(json_reply), true) => (json_reply.clone(), self.json_delay),
            (None, true) => (self.text_reply.clone(), self.json_delay),
            (_, false) => (self.text_reply.clone(), self.text_delay),
        };
        let model = self.model_for(request.model_class).to_string();
        self.requests.lock().unwrap().push(request);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Ok(text) => Ok(Completion {
                text,
                model,
                usage: self.usage,
            }),
            Err(status) => Err(LlmError::Api {
                status,
                message: "stubbed failure".to_string(),
            }),
        }
    }
}
