//! Store round-trip instrumentation.
//!
//! Implements OpenTelemetry semantic conventions for SQLite operations.

use tracing::{span, Level, Span};

/// Store operation types (maps to `db.operation.name`).
#[derive(Debug, Clone, Copy)]
pub enum DbOperation {
    /// Column metadata lookup
    Describe,
    /// EXPLAIN dry-run
    Explain,
    /// Statement execution
    Query,
    /// CSV import
    Import,
}

impl DbOperation {
    /// Get operation name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Describe => "describe",
            Self::Explain => "explain",
            Self::Query => "query",
            Self::Import => "import",
        }
    }
}

/// Create store operation span with semantic conventions.
///
/// # Arguments
///
/// * `operation` - Store operation type
/// * `collection` - Table name
/// * `namespace` - Database file path
///
/// # Returns
///
/// Tracing span with OpenTelemetry semantic attributes
pub fn db_span(operation: DbOperation, collection: &str, namespace: &str) -> Span {
    span!(
        Level::INFO,
        "db",
        otel.name = %format!("{} {}", operation.as_str(), collection),
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = operation.as_str(),
        db.collection.name = collection,
        db.namespace = namespace,
        db.response.returned_rows = tracing::field::Empty,
    )
}

/// Create span for a statement sent to the store.
///
/// `operation` is `Explain` for the dry-run and `Query` for execution.
pub fn db_query_span(operation: DbOperation, query_text: &str, namespace: &str) -> Span {
    span!(
        Level::INFO,
        "db.query",
        otel.name = operation.as_str(),
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = operation.as_str(),
        db.namespace = namespace,
        db.query.text = query_text,
        db.response.returned_rows = tracing::field::Empty,
    )
}

/// Record the number of rows a store operation returned on `span`.
pub fn record_returned_rows(span: &Span, rows: usize) {
    span.record("db.response.returned_rows", rows);
}
