//! Query execution.

use crate::storage::Store;
use crate::types::{Result, ResultSet, ValidatedStatement};
use tracing::info;

/// Run a validated statement and fetch every row.
///
/// The text is executed literally, without parameter binding. Only a
/// `ValidatedStatement` is accepted, so nothing unchecked gets here.
///
/// # Errors
///
/// Returns `AnalyticsError::ExecutionFailure` carrying the store's message
pub async fn execute(store: &dyn Store, statement: &ValidatedStatement) -> Result<ResultSet> {
    let rows = store.execute(statement.as_str()).await?;
    info!(rows = rows.len(), "Statement executed");
    Ok(rows)
}
