//! Relational store for the earnings table.
//!
//! The pipeline only talks to the store through the `Store` trait so tests
//! can count or refuse round-trips. `SqliteStore` is the real backend.

pub mod ingest;
pub mod sqlite;

pub use ingest::{import_csv, ImportSummary};
pub use sqlite::SqliteStore;

use crate::types::{ColumnInfo, ResultSet, Result};
use async_trait::async_trait;

/// The single table every question is answered from.
pub const TABLE_NAME: &str = "freelancer_earnings";

/// Storage collaborator.
///
/// Each call opens its own connection and releases it before returning,
/// so implementations hold no per-request state.
#[async_trait]
pub trait Store: Send + Sync {
    /// Column names and declared types of `table`, in definition order.
    ///
    /// Returns an empty list if the table does not exist.
    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Compile `sql` with `EXPLAIN` without producing its rows.
    async fn execute_dry_run(&self, sql: &str) -> Result<()>;

    /// Run `sql` as a literal statement and fetch every row.
    async fn execute(&self, sql: &str) -> Result<ResultSet>;
}
