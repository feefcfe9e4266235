//! Hosted chat-completions backend (Groq by default, any OpenAI-compatible API works).

use crate::config::RemoteProviderConfig;
use crate::error::{AssistantError, Result};
use crate::llm::CompletionProvider;
use async_trait::async_trait;
use tracing::{debug, warn};

const DEFAULT_SYSTEM: &str = "You are a professional HR consultant. Be concise and data-driven.";

pub struct RemoteProvider {
    config: RemoteProviderConfig,
    client: reqwest::Client,
}

impl RemoteProvider {
    pub fn new(config: RemoteProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, prompt: &str, system: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system.unwrap_or(DEFAULT_SYSTEM)},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionProvider for RemoteProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AssistantError::ProviderUnavailable("GROQ_API_KEY is not set".to_string())
        })?;

        debug!("Calling {} with {} prompt chars", self.config.model, prompt.len());
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt, system))
            .send()
            .await
            .map_err(|e| AssistantError::ProviderUnavailable(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::Llm(format!("LLM API error ({}): {}", status, error_text)));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        extract_content(&response_json)
    }

    fn name(&self) -> &str {
        "remote"
    }
}

/// Pull the first choice's message text out of a chat-completions response.
fn extract_content(response_json: &serde_json::Value) -> Result<String> {
    if let Some(error) = response_json.get("error") {
        return Err(AssistantError::Llm(format!("LLM API error: {}", error)));
    }

    let choice = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .ok_or_else(|| AssistantError::Llm("No choices in LLM response".to_string()))?;

    if choice.get("finish_reason").and_then(|r| r.as_str()) == Some("length") {
        warn!("LLM response was truncated due to length limit");
    }

    let content = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| AssistantError::Llm("No content in LLM response".to_string()))?
        .trim();

    if content.is_empty() {
        return Err(AssistantError::Llm("Empty content in LLM response".to_string()));
    }
    Ok(content.to_string())
}
