//! Intent Classifier
//!
//! Labels a question as a greeting, a dataset question, or a request for advice.

use crate::conversation::keywords::{contains_data_keyword, starts_with_word, GREETING_WORDS};
use crate::conversation::{last_assistant_looks_like_data, FollowupStrategy, KeywordFollowups, Turn};
use crate::llm::CompletionProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const CLASSIFIER_SYSTEM: &str = "You are an intent classifier. Reply with exactly one word.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Greeting,
    Data,
    Advice,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Greeting => write!(f, "GREETING"),
            Intent::Data => write!(f, "DATA"),
            Intent::Advice => write!(f, "ADVICE"),
        }
    }
}

impl Intent {
    /// Read a label from model output. Only the first word counts.
    pub fn parse_label(raw: &str) -> Option<Intent> {
        let word: String = raw
            .split_whitespace()
            .next()?
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match word.to_uppercase().as_str() {
            "GREETING" => Some(Intent::Greeting),
            "DATA" => Some(Intent::Data),
            "ADVICE" => Some(Intent::Advice),
            _ => None,
        }
    }
}

#[async_trait]
pub trait IntentStrategy: Send + Sync {
    async fn classify(
        &self,
        question: &str,
        context: &str,
        history: &[Turn],
        provider: &dyn CompletionProvider,
    ) -> Intent;
}

/// Deterministic rule used when no model is reachable.
pub fn keyword_intent(question: &str) -> Intent {
    let q = question.trim().to_lowercase();
    if GREETING_WORDS.iter().any(|g| starts_with_word(&q, g)) {
        Intent::Greeting
    } else if contains_data_keyword(&q) {
        Intent::Data
    } else {
        Intent::Advice
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentClassifier;

#[async_trait]
impl IntentStrategy for KeywordIntentClassifier {
    async fn classify(
        &self,
        question: &str,
        _context: &str,
        _history: &[Turn],
        _provider: &dyn CompletionProvider,
    ) -> Intent {
        keyword_intent(question)
    }
}

/// Asks the completion provider, with a follow-up override and a keyword fallback.
pub struct ProviderIntentClassifier {
    followups: Arc<dyn FollowupStrategy>,
}

impl Default for ProviderIntentClassifier {
    fn default() -> Self {
        Self::new(Arc::new(KeywordFollowups))
    }
}

impl ProviderIntentClassifier {
    pub fn new(followups: Arc<dyn FollowupStrategy>) -> Self {
        Self { followups }
    }
}

pub fn build_classification_prompt(question: &str, context: &str) -> String {
    let context_block = if context.trim().is_empty() {
        String::new()
    } else {
        format!("Conversation so far:\n{}\n\n", context)
    };
    format!(
        r#"Classify the user's message into exactly one category.

Categories:
- GREETING: small talk, hello, thanks, or asking what you can do.
- DATA: a question answered by querying the HR employee dataset (counts, averages, rates, filters, comparisons).
- ADVICE: a request for qualitative HR guidance or recommendations that needs no data lookup.

{}Message: {}

Reply with only one word: GREETING, DATA, or ADVICE."#,
        context_block, question
    )
}

#[async_trait]
impl IntentStrategy for ProviderIntentClassifier {
    async fn classify(
        &self,
        question: &str,
        context: &str,
        history: &[Turn],
        provider: &dyn CompletionProvider,
    ) -> Intent {
        if !history.is_empty() && self.followups.is_followup(question) && last_assistant_looks_like_data(history) {
            debug!("Follow-up after a data answer, classifying as DATA");
            return Intent::Data;
        }

        let prompt = build_classification_prompt(question, context);
        match provider.complete(&prompt, Some(CLASSIFIER_SYSTEM)).await {
            Ok(raw) => match Intent::parse_label(&raw) {
                Some(intent) => intent,
                None => {
                    warn!("Unrecognised intent label '{}', defaulting to DATA", raw.trim());
                    Intent::Data
                }
            },
            Err(e) => {
                warn!("Intent classification via {} failed ({}), using keyword rules", provider.name(), e);
                keyword_intent(question)
            }
        }
    }
}

/// Classify with the default provider-backed strategy.
pub async fn classify(
    question: &str,
    context: &str,
    history: &[Turn],
    provider: &dyn CompletionProvider,
) -> Intent {
    ProviderIntentClassifier::default()
        .classify(question, context, history, provider)
        .await
}
