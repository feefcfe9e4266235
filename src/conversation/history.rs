//! Bounded conversation history and the context views built from it.

use crate::conversation::keywords::{contains_data_keyword, DATA_RESPONSE_MARKERS};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-line character cap when folding history into a prompt.
pub const CONTEXT_LINE_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "SYSTEM"),
            Role::User => write!(f, "USER"),
            Role::Assistant => write!(f, "ASSISTANT"),
        }
    }
}

/// One message in the conversation. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Most recent turns of one session, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    max_turns: usize,
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns,
            turns: Vec::new(),
        }
    }

    /// Upper bound on stored turns: `2 * max_turns + 1`.
    pub fn capacity(&self) -> usize {
        self.max_turns.saturating_mul(2).saturating_add(1)
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        let capacity = self.capacity();
        if self.turns.len() > capacity {
            let excess = self.turns.len() - capacity;
            self.turns.drain(..excess);
        }
    }

    pub fn add(&mut self, role: Role, content: impl Into<String>) {
        self.push(Turn::new(role, content));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// History as it stood before the caller appended `question` as the latest user turn.
    pub fn without_pending(&self, question: &str) -> &[Turn] {
        prior_turns(&self.turns, question)
    }

    /// `[HH:MM:SS] ROLE: content` lines for display or export, times in UTC.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("[{}] {}: {}", t.created_at.format("%H:%M:%S"), t.role, t.content))
            .join("\n")
    }
}

/// Drop a trailing user turn equal to `question`, if present.
pub fn prior_turns<'a>(history: &'a [Turn], question: &str) -> &'a [Turn] {
    match history.split_last() {
        Some((last, rest)) if last.role == Role::User && last.content.trim() == question.trim() => rest,
        _ => history,
    }
}

/// The last `max_msgs` user/assistant turns as a newline-joined transcript.
pub fn build_context(history: &[Turn], max_msgs: usize) -> String {
    let relevant: Vec<&Turn> = history
        .iter()
        .filter(|t| matches!(t.role, Role::User | Role::Assistant))
        .collect();
    let start = relevant.len().saturating_sub(max_msgs);

    relevant[start..]
        .iter()
        .map(|t| format!("{}: {}", t.role, truncate_chars(t.content.trim(), CONTEXT_LINE_CHARS)))
        .join("\n")
}

/// Newest user turn that asked something of the dataset.
pub fn last_data_question(history: &[Turn]) -> Option<String> {
    history
        .iter()
        .rev()
        .find(|t| t.role == Role::User && contains_data_keyword(&t.content.to_lowercase()))
        .map(|t| t.content.clone())
}

/// Whether the newest assistant turn was a data answer.
pub fn last_assistant_looks_like_data(history: &[Turn]) -> bool {
    history
        .iter()
        .rev()
        .find(|t| t.role == Role::Assistant)
        .map(|t| {
            let lower = t.content.to_lowercase();
            DATA_RESPONSE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .unwrap_or(false)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
