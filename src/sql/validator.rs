//! Query Validator
//!
//! Static checks applied to every candidate query before it reaches the store.
//! Nothing here executes SQL.

use regex::Regex;
use thiserror::Error;

/// Statements that would mutate the store.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "drop", "delete", "insert", "update", "alter", "create", "truncate",
];

/// The rule a candidate query broke. `Display` is the user-facing reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Query must start with SELECT (only read queries are allowed).")]
    MissingSelect,

    #[error("Query is missing a FROM clause.")]
    MissingFrom,

    #[error("Query contains a forbidden keyword: {}.", .0.to_uppercase())]
    ForbiddenKeyword(String),

    #[error("Query must read from the `{0}` table.")]
    WrongTable(String),

    #[error("Query has unbalanced parentheses.")]
    UnbalancedParentheses,

    #[error("Query must end with a semicolon.")]
    MissingTerminator,
}

pub struct QueryValidator {
    table: String,
    table_pattern: Regex,
}

impl QueryValidator {
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let table_pattern = Regex::new(&format!(r#"(?i)(^|[^a-z0-9_]){}([^a-z0-9_]|$)"#, regex::escape(&table)))
            .expect("escaped table name is a valid pattern");
        Self { table, table_pattern }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Accept `sql` only if every rule holds; otherwise report the first rule broken.
    pub fn validate(&self, sql: &str) -> Result<(), ValidationIssue> {
        let normalized = sql.split_whitespace().collect::<Vec<_>>().join(" ");
        let lower = normalized.to_lowercase();

        if !lower.starts_with("select") {
            return Err(ValidationIssue::MissingSelect);
        }

        if !lower.contains(" from ") {
            return Err(ValidationIssue::MissingFrom);
        }

        let forbidden = lower
            .split(|c: char| c.is_whitespace() || matches!(c, ';' | '(' | ')' | ','))
            .find(|token| FORBIDDEN_KEYWORDS.contains(token));
        if let Some(keyword) = forbidden {
            return Err(ValidationIssue::ForbiddenKeyword(keyword.to_string()));
        }

        if !self.table_pattern.is_match(&lower) {
            return Err(ValidationIssue::WrongTable(self.table.clone()));
        }

        if !parentheses_balanced(&lower) {
            return Err(ValidationIssue::UnbalancedParentheses);
        }

        if !lower.ends_with(';') {
            return Err(ValidationIssue::MissingTerminator);
        }

        Ok(())
    }
}

fn parentheses_balanced(sql: &str) -> bool {
    let mut depth: i64 = 0;
    for c in sql.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
