//! Completion providers.
//!
//! The pipeline only ever sees `dyn CompletionProvider`; which backend answers is
//! chosen per question through [`ProviderKind`].

pub mod local;
pub mod remote;

pub use local::LocalProvider;
pub use remote::RemoteProvider;

use crate::config::AssistantConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Turns a prompt (plus an optional system instruction) into generated text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String>;

    fn name(&self) -> &str;

    /// Free whatever the backend holds between calls. Returns whether anything was held.
    async fn release(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Local,
    Remote,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Local => write!(f, "local"),
            ProviderKind::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "falcon" | "llama" => Ok(ProviderKind::Local),
            "remote" | "groq" | "api" => Ok(ProviderKind::Remote),
            other => Err(format!("unknown provider '{}' (expected 'local' or 'remote')", other)),
        }
    }
}

/// Both interchangeable backends, selected per question.
#[derive(Clone)]
pub struct Providers {
    local: Arc<dyn CompletionProvider>,
    remote: Arc<dyn CompletionProvider>,
}

impl Providers {
    pub fn new(local: Arc<dyn CompletionProvider>, remote: Arc<dyn CompletionProvider>) -> Self {
        Self { local, remote }
    }

    /// One provider behind both selectors.
    pub fn single(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            local: Arc::clone(&provider),
            remote: provider,
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            local: Arc::new(LocalProvider::new(config.local.clone())),
            remote: Arc::new(RemoteProvider::new(config.remote.clone())),
        }
    }

    pub fn select(&self, kind: ProviderKind) -> Arc<dyn CompletionProvider> {
        match kind {
            ProviderKind::Local => Arc::clone(&self.local),
            ProviderKind::Remote => Arc::clone(&self.remote),
        }
    }

    /// Release both backends. Call once the process is done answering.
    pub async fn shutdown(&self) {
        for provider in [&self.local, &self.remote] {
            if provider.release().await {
                info!("Released {} provider", provider.name());
            }
        }
    }
}

/// Remove markdown code fences a model wrapped around its answer.
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Releasable {
        completions: AtomicUsize,
        releases: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for Releasable {
        async fn complete(&self, _prompt: &str, _system: Option<&str>) -> Result<String> {
            self.completions.fetch_add(1, Ordering::SeqCst);
            Ok("ok".to_string())
        }

        fn name(&self) -> &str {
            "releasable"
        }

        async fn release(&self) -> bool {
            self.releases.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn test_select_and_shutdown_reach_each_backend() {
        let local = Arc::new(Releasable::default());
        let remote = Arc::new(Releasable::default());
        let providers = Providers::new(local.clone(), remote.clone());

        providers.select(ProviderKind::Local).complete("q", None).await.unwrap();
        assert_eq!(local.completions.load(Ordering::SeqCst), 1);
        assert_eq!(remote.completions.load(Ordering::SeqCst), 0);

        providers.shutdown().await;
        assert_eq!(local.releases.load(Ordering::SeqCst), 1);
        assert_eq!(remote.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("local".parse::<ProviderKind>(), Ok(ProviderKind::Local));
        assert_eq!("Groq".parse::<ProviderKind>(), Ok(ProviderKind::Remote));
        assert!("openai-ish".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::Remote.to_string(), "remote");
    }

    #[test]
    fn test_strip_code_fences() {
        let raw = "```sql\nSELECT COUNT(*) FROM employees;\n```";
        assert_eq!(strip_code_fences(raw), "SELECT COUNT(*) FROM employees;");
        assert_eq!(strip_code_fences("  plain text "), "plain text");
    }
}
