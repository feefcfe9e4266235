//! SQL Generator with bounded retry.
//!
//! Each attempt asks the provider for a query, cleans the reply, and runs the
//! validator. A rejection is fed back into the next prompt as a correction; the SQL
//! text itself is never patched up here.

use crate::llm::{strip_code_fences, CompletionProvider};
use crate::sql::prompts::{
    build_explanation_prompt, build_generation_prompt, PreviousAttempt, EXPLAIN_SYSTEM, SQL_SYSTEM,
};
use crate::sql::validator::QueryValidator;
use crate::store::SchemaDescription;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Comment prefix marking a placeholder returned when no valid query was produced.
pub const FAILURE_MARKER: &str = "--";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub sql: String,
    /// One-sentence explanation on success; the last rejection reason on failure.
    pub explanation: String,
    pub attempts: usize,
}

impl GeneratedQuery {
    fn failed(reason: String, attempts: usize) -> Self {
        Self {
            sql: format!("{} generation failed: no valid query produced", FAILURE_MARKER),
            explanation: reason,
            attempts,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.sql.trim_start().starts_with(FAILURE_MARKER)
    }

    /// Why generation failed, when it did.
    pub fn failure_reason(&self) -> Option<&str> {
        self.is_failure().then_some(self.explanation.as_str())
    }
}

pub struct SqlGenerator<'a> {
    provider: &'a dyn CompletionProvider,
    validator: &'a QueryValidator,
}

impl<'a> SqlGenerator<'a> {
    pub fn new(provider: &'a dyn CompletionProvider, validator: &'a QueryValidator) -> Self {
        Self { provider, validator }
    }

    /// Produce a validated query for `question`, making at most `max_retries + 1` attempts.
    pub async fn generate_and_validate(
        &self,
        question: &str,
        schema: &SchemaDescription,
        context: &str,
        max_retries: usize,
    ) -> GeneratedQuery {
        let mut previous: Option<PreviousAttempt> = None;
        let max_attempts = max_retries.saturating_add(1);

        for attempt in 1..=max_attempts {
            info!("SQL generation attempt {} of {}", attempt, max_attempts);
            let prompt = build_generation_prompt(question, schema, context, previous.as_ref());

            let raw = match self.provider.complete(&prompt, Some(SQL_SYSTEM)).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("SQL generation via {} failed: {}", self.provider.name(), e);
                    return GeneratedQuery::failed(format!("the language model could not be reached ({})", e), attempt);
                }
            };

            let sql = clean_sql_response(&raw);
            debug!("Candidate SQL: {}", sql);

            match self.validator.validate(&sql) {
                Ok(()) => {
                    info!("Valid SQL on attempt {}", attempt);
                    let explanation = self.explain(question, &sql).await;
                    return GeneratedQuery {
                        sql,
                        explanation,
                        attempts: attempt,
                    };
                }
                Err(issue) => {
                    warn!("Attempt {} rejected: {}", attempt, issue);
                    previous = Some(PreviousAttempt {
                        sql,
                        reason: issue.to_string(),
                    });
                }
            }
        }

        let reason = previous
            .map(|p| p.reason)
            .unwrap_or_else(|| "no attempts were made".to_string());
        GeneratedQuery::failed(reason, max_attempts)
    }

    async fn explain(&self, question: &str, sql: &str) -> String {
        match self
            .provider
            .complete(&build_explanation_prompt(question, sql), Some(EXPLAIN_SYSTEM))
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Could not get query explanation: {}", e);
                String::new()
            }
        }
    }
}

fn is_select_line(line: &str) -> bool {
    line.trim_start().to_lowercase().starts_with("select")
}

/// Pull the SQL statement out of a model reply.
pub fn clean_sql_response(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = match text.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("sql:") => text[4..].trim_start().to_string(),
        _ => text,
    };

    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let start = match first {
        Some(i) if is_select_line(lines[i]) => i,
        Some(i) => lines[i..]
            .iter()
            .position(|l| is_select_line(l))
            .map(|offset| i + offset)
            .unwrap_or(i),
        None => return String::new(),
    };

    let statement: Vec<&str> = lines[start..]
        .iter()
        .take_while(|l| !l.trim().is_empty())
        .map(|l| l.trim_end())
        .collect();

    let mut sql = statement.join("\n").trim().to_string();
    if !sql.is_empty() && !sql.ends_with(';') {
        sql.push(';');
    }
    sql
}
