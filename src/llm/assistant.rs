//! Intent classification and SQL generation on top of a language model.
//!
//! Both operations degrade instead of failing: classification falls back to
//! `Intent::Unknown` and generation to `SELECT 1`. The safety gate and the
//! store are what reject bad SQL, so the pipeline always has something to
//! pass downstream.

use crate::audit::{AuditLog, AuditRecord};
use crate::llm::prompts;
use crate::llm::provider::{LanguageModel, ResponseShape};
use crate::otel::{llm_span, LlmOperation};
use crate::types::{CandidateStatement, Intent, Result, SchemaDescription};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

/// Sampling temperature for both calls (deterministic).
pub const TEMPERATURE: f32 = 0.0;

/// The capabilities the pipeline needs from a model backend.
///
/// Neither method fails; implementations return their degraded value instead.
#[async_trait]
pub trait QueryAssistant: Send + Sync {
    /// Classify `question`.
    async fn detect_intent(&self, question: &str) -> Intent;

    /// Produce one SQL statement answering `question` over `schema`.
    async fn generate_sql(&self, question: &str, schema: &SchemaDescription) -> CandidateStatement;
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    intent: String,
}

#[derive(Debug, Deserialize)]
struct SqlResponse {
    sql: String,
}

/// `QueryAssistant` backed by any `LanguageModel`.
pub struct ModelAssistant<M> {
    model: M,
    audit: Arc<dyn AuditLog>,
}

impl<M: LanguageModel> ModelAssistant<M> {
    /// Create assistant.
    ///
    /// # Arguments
    ///
    /// * `model` - Backend used for both operations
    /// * `audit` - Sink receiving every classification and generation attempt
    pub fn new(model: M, audit: Arc<dyn AuditLog>) -> Self {
        Self { model, audit }
    }

    async fn request_intent(&self, question: &str) -> Result<String> {
        let prompt = prompts::intent_prompt(question);
        let value = self
            .model
            .generate_structured(&prompt, &ResponseShape::INTENT, TEMPERATURE)
            .await?;
        let parsed: IntentResponse = serde_json::from_value(value)?;
        Ok(parsed.intent)
    }

    async fn request_sql(&self, question: &str, schema: &SchemaDescription) -> Result<String> {
        let prompt = prompts::sql_prompt(schema, question);
        let value = self
            .model
            .generate_structured(&prompt, &ResponseShape::SQL, TEMPERATURE)
            .await?;
        let parsed: SqlResponse = serde_json::from_value(value)?;
        Ok(parsed.sql.trim().to_string())
    }
}

#[async_trait]
impl<M: LanguageModel> QueryAssistant for ModelAssistant<M> {
    async fn detect_intent(&self, question: &str) -> Intent {
        let span = llm_span(
            LlmOperation::DetectIntent,
            self.model.provider_name(),
            self.model.model_name(),
        );

        let intent = match self.request_intent(question).instrument(span).await {
            Ok(raw) => {
                let intent = Intent::parse(&raw);
                info!(%intent, raw = %raw, "Intent detected");
                intent
            }
            Err(e) => {
                warn!(error = %e, "Intent detection failed, using unknown");
                Intent::Unknown
            }
        };

        self.audit.record(AuditRecord::Intent {
            question: question.to_string(),
            intent,
        });
        intent
    }

    async fn generate_sql(&self, question: &str, schema: &SchemaDescription) -> CandidateStatement {
        let span = llm_span(
            LlmOperation::GenerateSql,
            self.model.provider_name(),
            self.model.model_name(),
        );

        let (candidate, fallback) = match self.request_sql(question, schema).instrument(span).await {
            Ok(sql) => {
                info!(sql = %sql, "SQL generated");
                (CandidateStatement::new(sql), false)
            }
            Err(e) => {
                warn!(error = %e, "SQL generation failed, using fallback statement");
                (CandidateStatement::fallback(), true)
            }
        };

        self.audit.record(AuditRecord::Sql {
            question: question.to_string(),
            sql: candidate.as_str().to_string(),
            fallback,
        });
        candidate
    }
}
