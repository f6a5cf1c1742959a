//! Core data types for the analytics pipeline.
//!
//! - `Intent`, `CandidateStatement`, `ValidatedStatement`: the stages a question passes through
//! - `SchemaDescription`, `ResultSet`: what the store hands back
//! - `AnalyticsError`: error type for all operations
//! - `Result`: convenient result type alias

pub mod error;
pub mod statement;

pub use error::{AnalyticsError, Result, UnsafeReason};
pub use statement::{
    CandidateStatement, ColumnInfo, Intent, ResultSet, Row, SchemaDescription, ValidatedStatement,
    Value,
};
