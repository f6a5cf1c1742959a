//! Freelancer earnings analytics - natural language questions over SQLite
//!
//! Answers questions about the freelancer earnings dataset by:
//! - Classifying the question's intent with a language model
//! - Generating one SQL statement from the live table schema
//! - Refusing anything that is not a single SELECT, then dry-running it
//! - Executing the validated statement and rendering the rows
//!
//! Can be used as:
//! - Library (`Pipeline` over any `QueryAssistant` and `Store`)
//! - CLI (`earnings ask "..."`)

pub mod audit;
pub mod config;
pub mod llm;
pub mod otel;
pub mod pipeline;
pub mod schema;
pub mod sql;
pub mod storage;
pub mod types;

pub use audit::{AuditLog, AuditRecord, JsonlAuditLog, MemoryAuditLog, NullAuditLog};
pub use config::{Config, LlmConfig};
pub use llm::{HttpModel, LanguageModel, ModelAssistant, QueryAssistant};
pub use pipeline::{Outcome, OutputMode, Pipeline};
pub use schema::describe_schema;
pub use storage::{import_csv, SqliteStore, Store, TABLE_NAME};
pub use types::{AnalyticsError, Result};
