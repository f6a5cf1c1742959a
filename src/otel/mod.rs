//! OpenTelemetry-style instrumentation for the analytics pipeline.
//!
//! Spans follow the OpenTelemetry semantic conventions so any subscriber
//! that understands `otel.*` fields can export them:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//! - https://opentelemetry.io/docs/specs/semconv/gen-ai/
//!
//! # Span naming
//!
//! - Store round-trips: `{db.operation.name} {target}`, e.g. `describe freelancer_earnings`
//! - Model calls: `{gen_ai.operation.name} {model}`, e.g. `generate_sql gemini-2.0-flash`
//! - One `question` span per pipeline run, carrying a `request_id`
//!
//! # Example
//!
//! ```rust,ignore
//! use earnings_analytics::otel::{db_span, DbOperation};
//!
//! let span = db_span(DbOperation::Describe, "freelancer_earnings", "data/freelancer_earnings.db");
//! let _guard = span.entered();
//! ```

pub mod db;
pub mod llm;

pub use db::{db_query_span, db_span, record_returned_rows, DbOperation};
pub use llm::{llm_span, record_token_usage, LlmOperation};

use tracing::{span, Level, Span};
use uuid::Uuid;

/// Create the per-question span.
pub fn question_span(request_id: Uuid) -> Span {
    span!(
        Level::INFO,
        "question",
        otel.kind = "internal",
        request_id = %request_id,
        intent = tracing::field::Empty,
    )
}
