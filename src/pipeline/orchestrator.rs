//! Sequences one question through classification, generation, validation
//! and execution.

use crate::llm::QueryAssistant;
use crate::otel::question_span;
use crate::pipeline::response::Outcome;
use crate::schema::describe_schema;
use crate::sql::{execute, validate};
use crate::storage::Store;
use crate::types::Intent;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// Question-answering pipeline.
///
/// Holds no per-question state; `handle` may be called any number of
/// times, including concurrently.
#[derive(Clone)]
pub struct Pipeline {
    assistant: Arc<dyn QueryAssistant>,
    store: Arc<dyn Store>,
}

impl Pipeline {
    pub fn new(assistant: Arc<dyn QueryAssistant>, store: Arc<dyn Store>) -> Self {
        Self { assistant, store }
    }

    /// Answer `question`.
    ///
    /// Never fails: every error is logged here and turned into an
    /// `Outcome` the caller can render.
    pub async fn handle(&self, question: &str) -> Outcome {
        let span = question_span(Uuid::new_v4());
        let outcome = self.run(question).instrument(span).await;
        info!(outcome = outcome.kind(), "Question handled");
        outcome
    }

    async fn run(&self, question: &str) -> Outcome {
        if question.trim().is_empty() {
            return Outcome::BlankInput;
        }

        let intent = self.assistant.detect_intent(question).await;
        tracing::Span::current().record("intent", intent.as_str());

        match intent {
            Intent::Sql => self.answer(question).await,
            Intent::Smalltalk => Outcome::SmallTalk,
            Intent::Help => Outcome::Help,
            Intent::Unknown => Outcome::UnknownIntent,
        }
    }

    async fn answer(&self, question: &str) -> Outcome {
        let schema = match describe_schema(self.store.as_ref()).await {
            Ok(schema) => schema,
            Err(e) => {
                error!(error = %e, "Schema introspection failed");
                return Outcome::Failed {
                    sql: None,
                    error: e.to_string(),
                };
            }
        };

        let candidate = self.assistant.generate_sql(question, &schema).await;
        let sql = candidate.as_str().to_string();

        let statement = match validate(self.store.as_ref(), candidate).await {
            Ok(statement) => statement,
            Err(e) => {
                warn!(sql = %sql, error = %e, "Generated statement refused");
                return Outcome::UnsafeSql { sql };
            }
        };

        match execute(self.store.as_ref(), &statement).await {
            Ok(rows) => Outcome::Answered { sql, rows },
            Err(e) => {
                error!(sql = %sql, error = %e, "Statement execution failed");
                Outcome::Failed {
                    sql: Some(sql),
                    error: e.to_string(),
                }
            }
        }
    }
}
