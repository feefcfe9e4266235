//! Runtime configuration.
//!
//! Values come from the process environment (the binary loads `.env` first via
//! `dotenv`), falling back to the defaults below. CLI flags override a few of them.

use crate::error::{AssistantError, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DB_PATH: &str = "db/hr.sqlite";
pub const DEFAULT_TABLE: &str = "employees";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LOCAL_URL: &str = "http://127.0.0.1:8081";
pub const MAX_TURNS_LIMIT: usize = 1_000;
pub const MAX_RETRIES_LIMIT: usize = 10;

/// Settings for the hosted chat-completions backend.
#[derive(Debug, Clone)]
pub struct RemoteProviderConfig {
    /// `None` means the provider reports itself unavailable on every call.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RemoteProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 400,
        }
    }
}

/// Settings for the local inference server (llama.cpp `llama-server`).
#[derive(Debug, Clone)]
pub struct LocalProviderConfig {
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOCAL_URL.to_string(),
            max_tokens: 220,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub database_path: PathBuf,
    pub table_name: String,
    /// History keeps at most `2 * max_turns + 1` turns.
    pub max_turns: usize,
    /// Extra generation attempts after the first one.
    pub max_retries: usize,
    /// Prior user/assistant messages folded into prompts.
    pub context_messages: usize,
    pub display_row_limit: usize,
    pub sample_rows: usize,
    pub remote: RemoteProviderConfig,
    pub local: LocalProviderConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            table_name: DEFAULT_TABLE.to_string(),
            max_turns: 10,
            max_retries: 2,
            context_messages: 6,
            display_row_limit: 25,
            sample_rows: 3,
            remote: RemoteProviderConfig::default(),
            local: LocalProviderConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Build a config from environment variables, using defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let remote = RemoteProviderConfig {
            api_key: get("GROQ_API_KEY"),
            base_url: get("GROQ_BASE_URL").unwrap_or(defaults.remote.base_url),
            model: get("GROQ_MODEL").unwrap_or(defaults.remote.model),
            ..defaults.remote
        };

        let local = LocalProviderConfig {
            base_url: get("LOCAL_LLM_URL").unwrap_or(defaults.local.base_url),
            max_tokens: parse_or(get("LOCAL_LLM_MAX_TOKENS"), "LOCAL_LLM_MAX_TOKENS", defaults.local.max_tokens)?,
            ..defaults.local
        };

        let config = Self {
            database_path: get("HR_DB_PATH").map(PathBuf::from).unwrap_or(defaults.database_path),
            table_name: get("HR_TABLE").unwrap_or(defaults.table_name),
            max_turns: parse_or(get("HR_MAX_TURNS"), "HR_MAX_TURNS", defaults.max_turns)?,
            max_retries: parse_or(get("HR_MAX_RETRIES"), "HR_MAX_RETRIES", defaults.max_retries)?,
            context_messages: parse_or(get("HR_CONTEXT_MESSAGES"), "HR_CONTEXT_MESSAGES", defaults.context_messages)?,
            display_row_limit: parse_or(get("HR_DISPLAY_ROWS"), "HR_DISPLAY_ROWS", defaults.display_row_limit)?,
            sample_rows: parse_or(get("HR_SAMPLE_ROWS"), "HR_SAMPLE_ROWS", defaults.sample_rows)?,
            remote,
            local,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(AssistantError::Config("table name must not be empty".to_string()));
        }
        if !self
            .table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AssistantError::Config(format!(
                "table name '{}' must be a plain identifier",
                self.table_name
            )));
        }
        if self.max_turns > MAX_TURNS_LIMIT {
            return Err(AssistantError::Config(format!(
                "HR_MAX_TURNS must be at most {} (got {})",
                MAX_TURNS_LIMIT, self.max_turns
            )));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(AssistantError::Config(format!(
                "max retries must be at most {} (got {})",
                MAX_RETRIES_LIMIT, self.max_retries
            )));
        }
        if self.display_row_limit == 0 {
            return Err(AssistantError::Config("HR_DISPLAY_ROWS must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AssistantError::Config(format!("{} has invalid value '{}'", key, value))),
    }
}
