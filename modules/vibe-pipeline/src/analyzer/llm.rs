use ai_client::util::truncate_to_char_boundary;
use ai_client::OpenAi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{prompts, AnalysisKind, Analyzer};
use crate::config::ModelsConfig;

/// `Analyzer` backed by an OpenAI chat model in JSON mode.
pub struct LlmAnalyzer {
    ai: OpenAi,
    max_payload_bytes: usize,
}

impl LlmAnalyzer {
    pub fn new(ai: OpenAi, max_payload_bytes: usize) -> Self {
        Self {
            ai,
            max_payload_bytes,
        }
    }

    /// Build from the `[models]` config section. Reads `OPENAI_API_KEY`.
    pub fn from_config(models: &ModelsConfig) -> Result<Self> {
        let ai = OpenAi::from_env(&models.analysis)?.with_temperature(models.temperature);
        Ok(Self::new(ai, models.max_payload_bytes))
    }

    fn render_payload(&self, payload: &Value) -> Result<String> {
        let json = serde_json::to_string_pretty(payload)
            .context("Failed to serialize analyzer payload")?;
        if json.len() > self.max_payload_bytes {
            debug!(
                bytes = json.len(),
                max = self.max_payload_bytes,
                "Truncating analyzer payload"
            );
            return Ok(truncate_to_char_boundary(&json, self.max_payload_bytes).to_string());
        }
        Ok(json)
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    async fn analyze(&self, kind: AnalysisKind, payload: Value) -> Result<Value> {
        let payload = self.render_payload(&payload)?;
        debug!(kind = %kind, model = self.ai.model(), bytes = payload.len(), "Analyzer call");

        self.ai
            .json_completion(prompts::system_prompt(kind), prompts::user_prompt(kind, &payload))
            .await
            .with_context(|| format!("{kind} analysis request failed"))
    }
}
