#![allow(dead_code)]

use async_trait::async_trait;
use hr_insight::error::{AssistantError, Result};
use hr_insight::llm::{CompletionProvider, Providers};
use hr_insight::sql::prompts::{CONSULTANT_SYSTEM, EXPLAIN_SYSTEM, SQL_SYSTEM};
use hr_insight::{AssistantConfig, QuestionRouter};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const EMPLOYEE_COUNT: i64 = 1470;
pub const DEPARTMENTS: [&str; 3] = ["Sales", "Research & Development", "Human Resources"];

/// Build a 1470-row `employees` table. Row `i` (1-based) is in `DEPARTMENTS[i % 3]`,
/// works overtime when `i % 4 == 0`, and has left when `i % 6 == 0`.
pub fn create_fixture_db(dir: &Path) -> std::result::Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join("hr.sqlite");
    let mut conn = Connection::open(&path)?;
    conn.execute_batch(
        "CREATE TABLE employees (
            EmployeeNumber INTEGER,
            Age INTEGER,
            Department TEXT,
            MonthlyIncome INTEGER,
            OverTime TEXT,
            Attrition TEXT
        );",
    )?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO employees VALUES (?1, ?2, ?3, ?4, ?5, ?6)")?;
        for i in 1..=EMPLOYEE_COUNT {
            let department = DEPARTMENTS[(i % 3) as usize];
            let overtime = if i % 4 == 0 { "Yes" } else { "No" };
            let attrition = if i % 6 == 0 { "Yes" } else { "No" };
            stmt.execute(params![i, 18 + i % 43, department, 1000 + (i * 37) % 19000, overtime, attrition])?;
        }
    }
    tx.commit()?;
    Ok(path)
}

/// Which kind of request a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Classify,
    Generate,
    Explain,
    Insight,
    Advice,
}

pub fn call_kind(prompt: &str, system: Option<&str>) -> Call {
    match system {
        Some(s) if s == SQL_SYSTEM => Call::Generate,
        Some(s) if s == EXPLAIN_SYSTEM => Call::Explain,
        Some(s) if s == CONSULTANT_SYSTEM && prompt.contains("The HR dataset returned") => Call::Insight,
        Some(s) if s == CONSULTANT_SYSTEM => Call::Advice,
        _ => Call::Classify,
    }
}

type Script = dyn Fn(Call, &str) -> Result<String> + Send + Sync;

/// Provider double driven by a closure; records every call.
pub struct StubProvider {
    script: Box<Script>,
    calls: Mutex<Vec<(Call, String)>>,
}

impl StubProvider {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(Call, &str) -> Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails as if no credentials were configured.
    pub fn unavailable() -> Arc<Self> {
        Self::new(|_, _| Err(AssistantError::ProviderUnavailable("GROQ_API_KEY is not set".to_string())))
    }

    pub fn count(&self, kind: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompts(&self, kind: Call) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let kind = call_kind(prompt, system);
        self.calls.lock().unwrap().push((kind, prompt.to_string()));
        (self.script)(kind, prompt)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Classifies everything as `label`, answers generation with `sql`.
pub fn data_script(label: &'static str, sql: &'static str) -> impl Fn(Call, &str) -> Result<String> + Send + Sync {
    move |kind, _prompt| {
        Ok(match kind {
            Call::Classify => label.to_string(),
            Call::Generate => sql.to_string(),
            Call::Explain => "Counts the matching employee rows.".to_string(),
            Call::Insight => "This gives a baseline for workforce planning.".to_string(),
            Call::Advice => "Run stay interviews with high performers.".to_string(),
        })
    }
}

pub fn test_config(db_path: &Path) -> AssistantConfig {
    AssistantConfig {
        database_path: db_path.to_path_buf(),
        max_retries: 1,
        ..AssistantConfig::default()
    }
}

pub fn router_with(dir: &TempDir, provider: Arc<StubProvider>) -> QuestionRouter {
    let db = create_fixture_db(dir.path()).expect("fixture database");
    QuestionRouter::new(test_config(&db), Providers::single(provider))
}

pub fn router_with_providers(dir: &TempDir, providers: Providers) -> QuestionRouter {
    let db = create_fixture_db(dir.path()).expect("fixture database");
    QuestionRouter::new(test_config(&db), providers)
}
