//! Local inference backend.
//!
//! Talks to a llama.cpp `llama-server` holding the quantised model in memory. The
//! connection handle is built once, on the first completion, after the server reports
//! healthy, and dropped again by `release`; the next completion reconnects.

use crate::config::LocalProviderConfig;
use crate::error::{AssistantError, Result};
use crate::llm::CompletionProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const DEFAULT_SYSTEM: &str = "You are a professional HR consultant. Answer clearly and briefly.";

/// Live connection to a healthy inference server.
#[derive(Debug)]
struct LocalModelHandle {
    client: reqwest::Client,
    completion_url: String,
}

pub struct LocalProvider {
    config: LocalProviderConfig,
    handle: Mutex<Option<Arc<LocalModelHandle>>>,
}

impl LocalProvider {
    pub fn new(config: LocalProviderConfig) -> Self {
        Self {
            config,
            handle: Mutex::new(None),
        }
    }

    pub async fn is_loaded(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    async fn handle(&self) -> Result<Arc<LocalModelHandle>> {
        let mut slot = self.handle.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(self.connect().await?);
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    async fn connect(&self) -> Result<LocalModelHandle> {
        let base = self.config.base_url.trim_end_matches('/').to_string();
        info!("Connecting to local model server at {}", base);
        let client = reqwest::Client::new();
        let health = client
            .get(format!("{}/health", base))
            .send()
            .await
            .map_err(|e| AssistantError::ProviderUnavailable(format!("local model server unreachable: {}", e)))?;
        if !health.status().is_success() {
            return Err(AssistantError::ProviderUnavailable(format!(
                "local model server not ready ({})",
                health.status()
            )));
        }
        info!("Local model server ready");
        Ok(LocalModelHandle {
            client,
            completion_url: format!("{}/completion", base),
        })
    }
}

/// Plain-text prompt layout expected by the instruction-tuned local model.
pub fn render_prompt(prompt: &str, system: Option<&str>) -> String {
    format!(
        "{}\n\nQuestion: {}\n\nAnswer:",
        system.unwrap_or(DEFAULT_SYSTEM),
        prompt
    )
}

#[async_trait]
impl CompletionProvider for LocalProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let handle = self.handle().await?;
        let body = serde_json::json!({
            "prompt": render_prompt(prompt, system),
            "n_predict": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stop": ["\nQuestion:"],
        });

        debug!("Local completion with {} prompt chars", prompt.len());
        let response = handle
            .client
            .post(&handle.completion_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::ProviderUnavailable(format!("local completion failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::Llm(format!("local model error ({}): {}", status, error_text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Llm(format!("Failed to parse local model response: {}", e)))?;
        let content = json["content"]
            .as_str()
            .ok_or_else(|| AssistantError::Llm("No content in local model response".to_string()))?
            .trim();
        Ok(content.to_string())
    }

    fn name(&self) -> &str {
        "local"
    }

    async fn release(&self) -> bool {
        let released = self.handle.lock().await.take().is_some();
        if released {
            info!("Released local model handle");
        }
        released
    }
}
