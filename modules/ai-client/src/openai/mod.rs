mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::util::parse_json_object;
use client::OpenAiClient;
use types::{uses_max_completion_tokens, ChatRequest, WireMessage};

const MAX_OUTPUT_TOKENS: u32 = 4096;

// =============================================================================
// OpenAi
// =============================================================================

/// OpenAI chat-completions handle.
///
/// Cheap to clone and holds no per-call state, so one instance can serve
/// many concurrent analyses.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    temperature: f32,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
            base_url: None,
        }
    }

    /// Reads `OPENAI_API_KEY`, and `OPENAI_BASE_URL` when set.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let ai = Self::new(api_key, model);
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.is_empty() => ai.with_base_url(url),
            _ => ai,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    fn request(&self, system: String, user: String) -> ChatRequest {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(user));

        if uses_max_completion_tokens(&self.model) {
            request.max_completion_tokens(MAX_OUTPUT_TOKENS)
        } else {
            request
                .max_tokens(MAX_OUTPUT_TOKENS)
                .temperature(self.temperature)
        }
    }

    /// Plain chat completion.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = self.request(system.into(), user.into());
        self.client().chat(&request).await
    }

    /// Chat completion in JSON mode. The reply must be a JSON object.
    pub async fn json_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<Value> {
        let request = self.request(system.into(), user.into()).json_output();
        let text = self.client().chat(&request).await?;
        parse_json_object(&text)
    }
}
