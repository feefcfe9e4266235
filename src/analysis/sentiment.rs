//! Sentiment of employee profile text.
//!
//! The provider is asked for a `LABEL:` line and a `CONFIDENCE:` line. Anything it
//! gets wrong falls back to NEUTRAL with a score of 0.5.

use crate::error::{AssistantError, Result};
use crate::llm::CompletionProvider;
use crate::store::ExecutionGateway;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Columns that make up one profile line.
pub const PROFILE_COLUMNS: &[&str] = &["Department", "JobRole", "OverTime", "Attrition"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "POSITIVE"),
            SentimentLabel::Negative => write!(f, "NEGATIVE"),
            SentimentLabel::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

impl SentimentLabel {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "POSITIVE" => Some(SentimentLabel::Positive),
            "NEGATIVE" => Some(SentimentLabel::Negative),
            "NEUTRAL" => Some(SentimentLabel::Neutral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Model confidence in `[0, 1]`.
    pub score: f64,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: DEFAULT_CONFIDENCE,
        }
    }
}

pub fn build_sentiment_prompt(text: &str) -> String {
    format!(
        "You are a sentiment classifier.\n\
         Classify the sentiment of the text as one of: POSITIVE, NEGATIVE, NEUTRAL.\n\
         Return ONLY these two lines (no extra text):\n\
         LABEL: <POSITIVE/NEGATIVE/NEUTRAL>\n\
         CONFIDENCE: <0 to 1>\n\n\
         TEXT: {}",
        text
    )
}

/// Read the label and confidence lines from a model reply.
pub fn parse_sentiment(reply: &str) -> Sentiment {
    let mut sentiment = Sentiment::default();

    for line in reply.lines().map(str::trim) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim().to_uppercase().as_str() {
            "LABEL" => match SentimentLabel::parse(value) {
                Some(label) => sentiment.label = label,
                None => debug!("Unknown sentiment label '{}'", value.trim()),
            },
            "CONFIDENCE" => {
                sentiment.score = value.trim().parse::<f64>().unwrap_or(DEFAULT_CONFIDENCE);
            }
            _ => {}
        }
    }

    if !sentiment.score.is_finite() {
        sentiment.score = DEFAULT_CONFIDENCE;
    }
    sentiment.score = sentiment.score.clamp(0.0, 1.0);
    sentiment
}

pub async fn classify_sentiment(provider: &dyn CompletionProvider, text: &str) -> Result<Sentiment> {
    let reply = provider.complete(&build_sentiment_prompt(text), None).await?;
    let sentiment = parse_sentiment(&reply);
    debug!("Sentiment {} ({:.2}) for: {}", sentiment.label, sentiment.score, text);
    Ok(sentiment)
}

/// Pull `n` random rows and render each as one profile line.
pub fn sample_profiles(db_path: impl AsRef<Path>, table: &str, n: usize) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY RANDOM() LIMIT {};",
        PROFILE_COLUMNS.join(", "),
        table,
        n
    );
    let result = ExecutionGateway::new(db_path).run(&sql).map_err(|e| {
        warn!("Could not sample profiles: {}", e);
        AssistantError::Store(e.to_string())
    })?;

    Ok(result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| format!("{}: {}", column, value))
                .join(" | ")
        })
        .collect())
}
