//! Schema introspection for model prompts.

use crate::storage::{Store, TABLE_NAME};
use crate::types::{AnalyticsError, Result, SchemaDescription};
use tracing::{debug, warn};

/// Describe the earnings table as it is defined right now.
///
/// Regenerated on every call; nothing is cached.
///
/// # Errors
///
/// Returns `AnalyticsError::SchemaUnavailable` if the store cannot be read
/// or the table does not exist
pub async fn describe_schema(store: &dyn Store) -> Result<SchemaDescription> {
    let columns = store.describe_columns(TABLE_NAME).await.map_err(|e| {
        warn!(error = %e, table = TABLE_NAME, "Failed to read table metadata");
        AnalyticsError::SchemaUnavailable(e.to_string())
    })?;

    if columns.is_empty() {
        return Err(AnalyticsError::SchemaUnavailable(format!(
            "table '{}' does not exist",
            TABLE_NAME
        )));
    }

    debug!(columns = columns.len(), "Schema described");
    Ok(SchemaDescription {
        table: TABLE_NAME.to_string(),
        columns,
    })
}
