//! Execution Gateway
//!
//! Runs one read-only query against the store and maps backend failures onto a
//! small taxonomy the router can phrase for users. A fresh connection is opened per
//! call and dropped when the call returns.

use crate::store::value::{collect_rows, QueryResult};
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

lazy_static! {
    static ref NO_SUCH_COLUMN: Regex = Regex::new(r"no such column:\s*([^\s]+)").unwrap();
    static ref NO_SUCH_TABLE: Regex = Regex::new(r"no such table:\s*([^\s]+)").unwrap();
}

/// Why a query did not produce rows.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionFailure {
    #[error("Only SELECT statements are allowed.")]
    NotSelect,

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("SQL syntax error: {0}")]
    Syntax(String),

    #[error("Query failed: {0}")]
    Other(String),
}

impl ExecutionFailure {
    /// Map a backend error message onto the taxonomy.
    pub fn classify(message: &str) -> Self {
        if let Some(caps) = NO_SUCH_COLUMN.captures(message) {
            return ExecutionFailure::UnknownColumn(caps[1].to_string());
        }
        if let Some(caps) = NO_SUCH_TABLE.captures(message) {
            return ExecutionFailure::UnknownTable(caps[1].to_string());
        }
        let lower = message.to_lowercase();
        if lower.contains("syntax error") || lower.contains("incomplete input") || lower.contains("unrecognized token") {
            return ExecutionFailure::Syntax(message.to_string());
        }
        ExecutionFailure::Other(message.to_string())
    }

    /// Short category name used in logs.
    pub fn category(&self) -> &'static str {
        match self {
            ExecutionFailure::NotSelect => "not-select",
            ExecutionFailure::UnknownColumn(_) => "unknown-column",
            ExecutionFailure::UnknownTable(_) => "unknown-table",
            ExecutionFailure::Syntax(_) => "syntax-error",
            ExecutionFailure::Other(_) => "other",
        }
    }
}

/// Flattened outcome handed to the router: rows on success, failure otherwise.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub result: QueryResult,
    pub error: Option<ExecutionFailure>,
}

impl ExecutionOutcome {
    /// Empty on success.
    pub fn error_text(&self) -> String {
        self.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
    }
}

pub struct ExecutionGateway {
    db_path: PathBuf,
}

impl ExecutionGateway {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Run a SELECT and collect every row.
    pub fn run(&self, sql: &str) -> Result<QueryResult, ExecutionFailure> {
        if !sql.trim().to_lowercase().starts_with("select") {
            warn!("Rejected non-SELECT statement at the gateway");
            return Err(ExecutionFailure::NotSelect);
        }

        info!("Executing SQL: {}", sql);
        let conn = Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|e| ExecutionFailure::Other(format!("Failed to open database: {}", e)))?;

        let result = Self::query(&conn, sql).map_err(|e| {
            let failure = ExecutionFailure::classify(&e.to_string());
            warn!("Execution failed ({}): {}", failure.category(), e);
            failure
        })?;

        debug!("Query returned {} rows", result.row_count());
        Ok(result)
    }

    /// Like [`run`](Self::run) but never fails; the error rides along in the outcome.
    pub fn execute(&self, sql: &str) -> ExecutionOutcome {
        match self.run(sql) {
            Ok(result) => ExecutionOutcome { result, error: None },
            Err(failure) => ExecutionOutcome {
                result: QueryResult::default(),
                error: Some(failure),
            },
        }
    }

    fn query(conn: &Connection, sql: &str) -> rusqlite::Result<QueryResult> {
        let mut stmt = conn.prepare(sql)?;
        collect_rows(&mut stmt)
    }
}
