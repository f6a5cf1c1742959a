//! SQLite-backed store.

use crate::otel::{db_query_span, db_span, record_returned_rows, DbOperation};
use crate::storage::Store;
use crate::types::{AnalyticsError, ColumnInfo, ResultSet, Result, Value};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Store over a single SQLite database file.
///
/// Connections are opened per operation on the blocking pool and dropped
/// when the closure returns, including on error.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Create store for the database at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a read-only connection.
    ///
    /// Fails if the file does not exist; the pipeline never creates or
    /// writes the database.
    fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
        Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn namespace(&self) -> String {
        self.path.display().to_string()
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

fn describe(path: &Path, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let conn = SqliteStore::open_read_only(path)?;
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn explain(path: &Path, sql: &str) -> rusqlite::Result<()> {
    let conn = SqliteStore::open_read_only(path)?;
    let mut stmt = conn.prepare(&format!("EXPLAIN {}", sql))?;
    let mut rows = stmt.query([])?;
    // the plan listing is discarded; compiling it is the check
    while rows.next()?.is_some() {}
    Ok(())
}

fn query(path: &Path, sql: &str) -> rusqlite::Result<ResultSet> {
    let conn = SqliteStore::open_read_only(path)?;
    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();
    let mut rows = stmt.query([])?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(to_value(row.get_ref(i)?));
        }
        result.push(values);
    }
    Ok(ResultSet::new(result))
}

#[async_trait]
impl Store for SqliteStore {
    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let span = db_span(DbOperation::Describe, table, &self.namespace());
        let path = self.path.clone();
        let table_name = table.to_string();

        let columns = tokio::task::spawn_blocking(move || describe(&path, &table_name))
            .instrument(span.clone())
            .await??;

        record_returned_rows(&span, columns.len());
        Ok(columns)
    }

    async fn execute_dry_run(&self, sql: &str) -> Result<()> {
        let span = db_query_span(DbOperation::Explain, sql, &self.namespace());
        let path = self.path.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || explain(&path, &sql))
            .instrument(span)
            .await??;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        let span = db_query_span(DbOperation::Query, sql, &self.namespace());
        let path = self.path.clone();
        let sql = sql.to_string();

        let rows = tokio::task::spawn_blocking(move || query(&path, &sql))
            .instrument(span.clone())
            .await?
            .map_err(|e| AnalyticsError::ExecutionFailure(e.to_string()))?;

        record_returned_rows(&span, rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE freelancer_earnings (Freelancer_ID INTEGER PRIMARY KEY, Job_Category TEXT, Hourly_Rate REAL);
             INSERT INTO freelancer_earnings VALUES (1, 'Web Development', 42.5);
             INSERT INTO freelancer_earnings VALUES (2, NULL, 18.0);",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_describe_columns_in_definition_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("earnings.db");
        seed(&path);

        let store = SqliteStore::new(&path);
        let columns = store.describe_columns("freelancer_earnings").await.unwrap();

        assert_eq!(
            columns,
            vec![
                ColumnInfo::new("Freelancer_ID", "INTEGER"),
                ColumnInfo::new("Job_Category", "TEXT"),
                ColumnInfo::new("Hourly_Rate", "REAL"),
            ]
        );
    }

    #[tokio::test]
    async fn test_describe_missing_table_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("earnings.db");
        seed(&path);

        let store = SqliteStore::new(&path);
        assert!(store.describe_columns("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_database_file_is_not_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.db");

        let store = SqliteStore::new(&path);
        assert!(store.describe_columns("freelancer_earnings").await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_execute_maps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("earnings.db");
        seed(&path);

        let store = SqliteStore::new(&path);
        let rows = store
            .execute("SELECT Job_Category, Hourly_Rate FROM freelancer_earnings ORDER BY Freelancer_ID")
            .await
            .unwrap();

        assert_eq!(rows.to_string(), "[('Web Development', 42.5), (None, 18.0)]");
    }

    #[tokio::test]
    async fn test_execute_is_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("earnings.db");
        seed(&path);

        let store = SqliteStore::new(&path);
        let err = store
            .execute("DELETE FROM freelancer_earnings")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::ExecutionFailure(_)));

        let rows = store
            .execute("SELECT COUNT(*) FROM freelancer_earnings")
            .await
            .unwrap();
        assert_eq!(rows.to_string(), "[(2,)]");
    }

    #[tokio::test]
    async fn test_dry_run_reports_unknown_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("earnings.db");
        seed(&path);

        let store = SqliteStore::new(&path);
        assert!(store
            .execute_dry_run("SELECT Job_Category FROM freelancer_earnings")
            .await
            .is_ok());
        assert!(store
            .execute_dry_run("SELECT not_a_field FROM freelancer_earnings")
            .await
            .is_err());
    }
}
