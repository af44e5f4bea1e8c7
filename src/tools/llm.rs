use super::NarrativeGenerator;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use rig::prelude::*;
use rig::providers::openai;
use serde_json::Value;
use std::time::Duration;

/// OpenAI chat model driven through a rig agent. The role becomes the
/// agent preamble; a fresh agent is built per call so temperature and role
/// never leak between stages.
#[derive(Clone)]
pub struct RigGenerator {
    client: openai::Client,
    model: String,
    temperature: f64,
    timeout: Duration,
}

impl RigGenerator {
    pub fn new(api_key: &str, model: impl Into<String>, temperature: f64, timeout: Duration) -> Self {
        Self {
            client: openai::Client::new(api_key),
            model: model.into(),
            temperature,
            timeout,
        }
    }
}

#[async_trait]
impl NarrativeGenerator for RigGenerator {
    async fn generate(&self, role: &str, instructions: &str, context: Option<&Value>) -> Result<String> {
        let prompt = compose_prompt(instructions, context);
        let agent = self
            .client
            .agent(&self.model)
            .preamble(role)
            .temperature(self.temperature)
            .build();

        tokio::time::timeout(self.timeout, agent.prompt(&prompt))
            .await
            .map_err(|_| anyhow!("generation timed out after {}s", self.timeout.as_secs()))?
            .map_err(|e| anyhow!("Prompt error: {}", e))
    }
}

pub(crate) fn compose_prompt(instructions: &str, context: Option<&Value>) -> String {
    match context {
        Some(ctx) => format!(
            "{instructions}\n\nContext:\n```json\n{}\n```",
            serde_json::to_string_pretty(ctx).unwrap_or_else(|_| ctx.to_string())
        ),
        None => instructions.to_string(),
    }
}
