//! Prompt text for SQL generation, explanation, and result interpretation.

use crate::store::SchemaDescription;

pub const SQL_SYSTEM: &str =
    "You are a SQL expert. Generate ONLY valid SQLite queries. No explanations, no markdown.";

pub const EXPLAIN_SYSTEM: &str = "You explain SQL queries to HR business users in plain language.";

pub const CONSULTANT_SYSTEM: &str =
    "You are a professional HR consultant. Provide clear, actionable advice based on HR best practices.";

/// A rejected attempt carried into the next prompt.
#[derive(Debug, Clone)]
pub struct PreviousAttempt {
    pub sql: String,
    pub reason: String,
}

pub fn build_generation_prompt(
    question: &str,
    schema: &SchemaDescription,
    context: &str,
    previous: Option<&PreviousAttempt>,
) -> String {
    let mut parts = Vec::new();

    if let Some(previous) = previous {
        parts.push(format!(
            "Your previous attempt failed because: {}\nPrevious query:\n{}\nWrite a corrected query that fixes this problem.\n",
            previous.reason, previous.sql
        ));
    }

    parts.push("Generate ONE valid SQLite SELECT query that answers the user's question.".to_string());
    parts.push("\nSTRICT RULES:".to_string());
    parts.push("- Return ONLY the SQL query (no explanations, no markdown)".to_string());
    parts.push("- Use SELECT only (no INSERT/UPDATE/DELETE/DROP)".to_string());
    parts.push("- The query MUST include a FROM clause".to_string());
    parts.push(format!(
        "- Read only from the `{}` table and use the exact column names from the schema",
        schema.table
    ));
    parts.push(
        "- For rates/percentages use: SUM(CASE WHEN <condition> THEN 1 ELSE 0 END) * 100.0 / COUNT(*)".to_string(),
    );
    parts.push("- Match text values exactly as they appear in the sample rows".to_string());
    parts.push("- End the query with a semicolon".to_string());

    parts.push(format!("\nDATABASE SCHEMA:\n{}", schema));

    let sample = schema.render_sample();
    if !sample.is_empty() {
        parts.push(format!("\nSAMPLE ROWS:\n{}", sample));
    }

    if !context.trim().is_empty() {
        parts.push(format!("\nCONVERSATION SO FAR:\n{}", context));
    }

    parts.push(format!("\nUSER QUESTION:\n{}", question));
    parts.push("\nSQL QUERY (SQLite syntax):".to_string());

    parts.join("\n")
}

pub fn build_explanation_prompt(question: &str, sql: &str) -> String {
    format!(
        "In one sentence, explain what this SQL query computes to answer the question. \
         Do not repeat the SQL.\n\nQuestion: {}\n\nSQL:\n{}",
        question, sql
    )
}

pub fn build_insight_prompt(question: &str, formatted_result: &str) -> String {
    format!(
        "A user asked: \"{}\"\n\nThe HR dataset returned:\n{}\n\n\
         In two or three sentences, interpret this result from an HR consultant's point of view. \
         Do not invent numbers that are not shown above.",
        question, formatted_result
    )
}
