//! Schema introspection for the single HR relation.
//!
//! The rendering is consumed verbatim by the SQL generation prompt, so it must stay
//! deterministic: columns appear in table-definition order.

use crate::error::{AssistantError, Result};
use crate::store::value::{collect_rows, CellValue, QueryResult};
use itertools::Itertools;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use strsim::jaro_winkler;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Snapshot of the relation's structure, taken per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    /// A few live rows, shown to the model so it sees real value formats.
    pub sample: QueryResult,
}

impl SchemaDescription {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Sample rows as `Column=value` lines, one per row.
    pub fn render_sample(&self) -> String {
        self.sample
            .rows
            .iter()
            .map(|row| {
                self.sample
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(col, value)| match value {
                        CellValue::Real(v) => format!("{}={}", col, v),
                        other => format!("{}={}", col, other),
                    })
                    .join(", ")
            })
            .join("\n")
    }

    /// Closest real column to a name the backend rejected, if any is close enough.
    pub fn closest_column(&self, unknown: &str) -> Option<&str> {
        let target = unknown.rsplit('.').next().unwrap_or(unknown).to_lowercase();
        self.column_names()
            .map(|name| (name, jaro_winkler(&target, &name.to_lowercase())))
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name)
    }
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Table: {}", self.table)?;
        write!(f, "Columns:")?;
        for column in &self.columns {
            write!(f, "\n- {} ({})", column.name, column.data_type)?;
        }
        Ok(())
    }
}

/// Reads table structure from the SQLite store.
pub struct SchemaIntrospector {
    db_path: PathBuf,
    table: String,
}

impl SchemaIntrospector {
    pub fn new(db_path: impl AsRef<Path>, table: impl Into<String>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_WRITE).map_err(|e| {
            AssistantError::Store(format!(
                "Failed to open database {}: {}",
                self.db_path.display(),
                e
            ))
        })
    }

    /// Column names and declared types, without sample rows.
    pub fn describe(&self) -> Result<SchemaDescription> {
        let conn = self.connect()?;
        let columns = self.read_columns(&conn)?;
        Ok(SchemaDescription {
            table: self.table.clone(),
            columns,
            sample: QueryResult::default(),
        })
    }

    /// Column description plus up to `sample_size` rows.
    pub fn snapshot(&self, sample_size: usize) -> Result<SchemaDescription> {
        let conn = self.connect()?;
        let columns = self.read_columns(&conn)?;
        let sample = if sample_size == 0 {
            QueryResult::default()
        } else {
            self.read_sample(&conn, sample_size)?
        };
        debug!(
            "Schema snapshot for {}: {} columns, {} sample rows",
            self.table,
            columns.len(),
            sample.row_count()
        );
        Ok(SchemaDescription {
            table: self.table.clone(),
            columns,
            sample,
        })
    }

    fn read_columns(&self, conn: &Connection) -> Result<Vec<ColumnInfo>> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", self.table))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    data_type: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(AssistantError::Schema(format!(
                "Table '{}' not found in {}",
                self.table,
                self.db_path.display()
            )));
        }
        Ok(columns)
    }

    fn read_sample(&self, conn: &Connection, limit: usize) -> Result<QueryResult> {
        let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\" LIMIT {}", self.table, limit))?;
        Ok(collect_rows(&mut stmt)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("hr.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE employees (Age INTEGER, Department TEXT, MonthlyIncome INTEGER);
            INSERT INTO employees VALUES (41, 'Sales', 5993);
            INSERT INTO employees VALUES (49, 'Research & Development', 5130);
            "#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_describe_renders_columns_in_order() {
        let dir = TempDir::new().unwrap();
        let introspector = SchemaIntrospector::new(fixture(&dir), "employees");
        let schema = introspector.describe().unwrap();
        assert_eq!(
            schema.to_string(),
            "Table: employees\nColumns:\n- Age (INTEGER)\n- Department (TEXT)\n- MonthlyIncome (INTEGER)"
        );
        assert!(schema.sample.is_empty());
    }

    #[test]
    fn test_snapshot_includes_sample_rows() {
        let dir = TempDir::new().unwrap();
        let introspector = SchemaIntrospector::new(fixture(&dir), "employees");
        let schema = introspector.snapshot(1).unwrap();
        assert_eq!(schema.sample.row_count(), 1);
        assert_eq!(schema.render_sample(), "Age=41, Department=Sales, MonthlyIncome=5993");
    }

    #[test]
    fn test_missing_table_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let introspector = SchemaIntrospector::new(fixture(&dir), "staff");
        assert!(matches!(introspector.describe(), Err(AssistantError::Schema(_))));
    }

    #[test]
    fn test_missing_database_is_store_error() {
        let dir = TempDir::new().unwrap();
        let introspector = SchemaIntrospector::new(dir.path().join("absent.sqlite"), "employees");
        assert!(matches!(introspector.describe(), Err(AssistantError::Store(_))));
    }

    #[test]
    fn test_closest_column_suggestion() {
        let dir = TempDir::new().unwrap();
        let schema = SchemaIntrospector::new(fixture(&dir), "employees").describe().unwrap();
        assert_eq!(schema.closest_column("MonthlyIncom"), Some("MonthlyIncome"));
        assert_eq!(schema.closest_column("e.Departmnt"), Some("Department"));
        assert_eq!(schema.closest_column("zzz"), None);
    }
}
