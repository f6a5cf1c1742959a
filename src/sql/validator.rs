//! Safety gate for generated SQL.
//!
//! Two allow-list rules are checked on a trimmed, lower-cased copy of the
//! text, then the untouched text is compiled with `EXPLAIN`. The statement
//! that comes out is the candidate's text unchanged.
//!
//! The multi-statement rule is textual: a `;` inside a string literal is
//! rejected as well.

use crate::storage::Store;
use crate::types::{AnalyticsError, CandidateStatement, Result, UnsafeReason, ValidatedStatement};
use tracing::{debug, warn};

/// Apply the allow-list rules without touching the store.
///
/// # Errors
///
/// Returns `AnalyticsError::UnsafeStatement` naming the first rule broken
pub fn check_rules(candidate: &CandidateStatement) -> Result<()> {
    let normalized = candidate.as_str().trim().to_lowercase();

    if !normalized.starts_with("select") {
        return Err(AnalyticsError::UnsafeStatement(UnsafeReason::NotSelect));
    }

    if let Some(pos) = normalized.find(';') {
        if pos != normalized.len() - 1 {
            return Err(AnalyticsError::UnsafeStatement(UnsafeReason::MultipleStatements));
        }
    }

    Ok(())
}

/// Validate `candidate` for execution.
///
/// Allow-list rules run first; only a candidate that passes them is
/// dry-run against `store`.
///
/// # Errors
///
/// - `AnalyticsError::UnsafeStatement` if an allow-list rule is broken
/// - `AnalyticsError::InvalidStatement` with the store's message if the dry-run fails
pub async fn validate(store: &dyn Store, candidate: CandidateStatement) -> Result<ValidatedStatement> {
    if let Err(e) = check_rules(&candidate) {
        warn!(sql = %candidate, reason = %e, "Rejected statement");
        return Err(e);
    }

    if let Err(e) = store.execute_dry_run(candidate.as_str()).await {
        warn!(sql = %candidate, error = %e, "Statement failed dry-run");
        return Err(AnalyticsError::InvalidStatement(store_message(e)));
    }

    debug!(sql = %candidate, "Statement validated");
    Ok(ValidatedStatement::new(candidate))
}

fn store_message(err: AnalyticsError) -> String {
    match err {
        AnalyticsError::StorageError(e) => e.to_string(),
        AnalyticsError::ExecutionFailure(msg) => msg,
        other => other.to_string(),
    }
}
