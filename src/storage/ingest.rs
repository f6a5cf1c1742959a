//! CSV import into the earnings table.
//!
//! The table layout is inferred from the file:
//! - column types come from the first `SAMPLE_ROWS` data rows
//! - the first column whose name ends in `id` becomes the primary key
//!
//! Existing rows are replaced on every import.

use crate::otel::{db_span, DbOperation};
use crate::storage::TABLE_NAME;
use crate::types::{AnalyticsError, ColumnInfo, Result};
use csv::StringRecord;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{info, Instrument};

/// Rows inspected for type inference.
pub const SAMPLE_ROWS: usize = 100;

/// Inferred storage class of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    /// `true`/`false` literals, stored as 0/1
    Boolean,
    Text,
}

impl ColumnKind {
    /// Declared SQL type.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Convert one CSV cell. Cells that don't fit the kind are kept as text.
    fn convert(&self, cell: &str) -> SqlValue {
        if cell.is_empty() {
            return SqlValue::Null;
        }
        match self {
            Self::Integer => cell
                .parse::<i64>()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(cell.to_string())),
            Self::Real => cell
                .parse::<f64>()
                .map(SqlValue::Real)
                .unwrap_or_else(|_| SqlValue::Text(cell.to_string())),
            Self::Boolean => match parse_bool(cell) {
                Some(b) => SqlValue::Integer(i64::from(b)),
                None => SqlValue::Text(cell.to_string()),
            },
            Self::Text => SqlValue::Text(cell.to_string()),
        }
    }
}

/// Column definition derived from the CSV header and sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    pub primary_key: bool,
}

/// What an import did.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Option<String>,
    pub rows: usize,
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut all_int = true;
    let mut all_real = true;
    let mut all_bool = true;
    let mut seen = false;

    for cell in cells.filter(|c| !c.is_empty()) {
        seen = true;
        all_int &= cell.parse::<i64>().is_ok();
        all_real &= cell.parse::<f64>().is_ok();
        all_bool &= parse_bool(cell).is_some();
    }

    if !seen {
        // nothing to go on: an all-empty column reads as missing numbers
        ColumnKind::Real
    } else if all_bool {
        ColumnKind::Boolean
    } else if all_int {
        ColumnKind::Integer
    } else if all_real {
        ColumnKind::Real
    } else {
        ColumnKind::Text
    }
}

/// Infer column definitions from a header and sample rows.
///
/// Only the first `SAMPLE_ROWS` records are inspected.
pub fn infer_columns(headers: &StringRecord, records: &[StringRecord]) -> Vec<ColumnDef> {
    let sample = &records[..records.len().min(SAMPLE_ROWS)];
    let mut pk_set = false;

    headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let kind = infer_kind(sample.iter().map(|r| r.get(i).unwrap_or("")));
            let primary_key = !pk_set && name.to_ascii_lowercase().ends_with("id");
            pk_set |= primary_key;
            ColumnDef {
                name: name.to_string(),
                kind,
                primary_key,
            }
        })
        .collect()
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render the `CREATE TABLE IF NOT EXISTS` statement for `columns`.
pub fn create_table_sql(table: &str, columns: &[ColumnDef]) -> String {
    let defs = columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quote_ident(&c.name), c.kind.sql_type());
            if c.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            def
        })
        .collect::<Vec<_>>()
        .join(",\n    ");
    format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n)", quote_ident(table), defs)
}

fn read_csv(csv_path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(AnalyticsError::ingest(format!(
            "{} has no header row",
            csv_path.display()
        )));
    }

    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((headers, records))
}

fn import_blocking(db_path: &Path, csv_path: &Path) -> Result<ImportSummary> {
    let (headers, records) = read_csv(csv_path)?;
    let columns = infer_columns(&headers, &records);

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = Connection::open(db_path)?;
    conn.execute(&create_table_sql(TABLE_NAME, &columns), [])?;

    let insert = format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(TABLE_NAME),
        vec!["?"; columns.len()].join(", ")
    );

    let tx = conn.transaction()?;
    tx.execute(&format!("DELETE FROM {}", quote_ident(TABLE_NAME)), [])?;
    {
        let mut stmt = tx.prepare(&insert)?;
        for record in &records {
            let values = columns
                .iter()
                .enumerate()
                .map(|(i, c)| c.kind.convert(record.get(i).unwrap_or("")));
            stmt.execute(rusqlite::params_from_iter(values))?;
        }
    }
    tx.commit()?;

    Ok(ImportSummary {
        columns: columns
            .iter()
            .map(|c| ColumnInfo::new(c.name.clone(), c.kind.sql_type()))
            .collect(),
        primary_key: columns.iter().find(|c| c.primary_key).map(|c| c.name.clone()),
        rows: records.len(),
    })
}

/// Create the earnings table from `csv_path` (if missing) and load every row.
///
/// # Errors
///
/// Returns `AnalyticsError::CsvError` for unreadable files and
/// `AnalyticsError::StorageError` if the table can't be written
pub async fn import_csv(db_path: impl Into<PathBuf>, csv_path: impl Into<PathBuf>) -> Result<ImportSummary> {
    let db_path = db_path.into();
    let csv_path = csv_path.into();
    let span = db_span(DbOperation::Import, TABLE_NAME, &db_path.display().to_string());

    let summary = tokio::task::spawn_blocking({
        let db_path = db_path.clone();
        let csv_path = csv_path.clone();
        move || import_blocking(&db_path, &csv_path)
    })
    .instrument(span)
    .await??;

    info!(
        table = TABLE_NAME,
        rows = summary.rows,
        columns = summary.columns.len(),
        csv = %csv_path.display(),
        "CSV imported"
    );
    Ok(summary)
}
