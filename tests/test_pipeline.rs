//! End-to-end pipeline tests with a scripted language model and a real database.

mod common;

use async_trait::async_trait;
use common::{fixture_db, row_count};
use earnings_analytics::llm::ResponseShape;
use earnings_analytics::types::{AnalyticsError, Result};
use earnings_analytics::{
    AuditRecord, LanguageModel, MemoryAuditLog, ModelAssistant, Outcome, OutputMode, Pipeline,
    SqliteStore,
};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers intent prompts with `intent` and SQL prompts with `sql`.
struct ScriptedModel {
    intent: &'static str,
    sql: Option<&'static str>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate_structured(
        &self,
        _prompt: &str,
        shape: &ResponseShape,
        _temperature: f32,
    ) -> Result<JsonValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match shape.field {
            "intent" => Ok(json!({ "intent": self.intent })),
            _ => match self.sql {
                Some(sql) => Ok(json!({ "sql": sql })),
                None => Err(AnalyticsError::llm("model unavailable")),
            },
        }
    }
}

struct Harness {
    pipeline: Pipeline,
    audit: Arc<MemoryAuditLog>,
    calls: Arc<AtomicUsize>,
}

fn harness(store: SqliteStore, intent: &'static str, sql: Option<&'static str>) -> Harness {
    let calls = Arc::new(AtomicUsize::new(0));
    let audit = Arc::new(MemoryAuditLog::new());
    let model = ScriptedModel {
        intent,
        sql,
        calls: calls.clone(),
    };
    let assistant = Arc::new(ModelAssistant::new(model, audit.clone()));
    Harness {
        pipeline: Pipeline::new(assistant, Arc::new(store)),
        audit,
        calls,
    }
}

#[tokio::test]
async fn test_smalltalk_is_deflected_without_generation() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(SqliteStore::new(&db_path), "smalltalk", Some("SELECT 1"));

    let outcome = h.pipeline.handle("Hi, how are you?").await;

    assert_eq!(outcome, Outcome::SmallTalk);
    assert_eq!(
        outcome.render(OutputMode::Verbose),
        "This is an informal question unrelated to analytics."
    );
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert!(h
        .audit
        .records()
        .iter()
        .all(|r| matches!(r, AuditRecord::Intent { .. })));
}

#[tokio::test]
async fn test_sql_question_is_answered() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(
        SqliteStore::new(&db_path),
        "sql",
        Some("SELECT Job_Category, Earnings_USD FROM freelancer_earnings WHERE Freelancer_ID=4"),
    );

    let outcome = h.pipeline.handle("What did freelancer 4 earn, and in which category?").await;

    assert_eq!(
        outcome.render(OutputMode::AnswerOnly),
        "Answer: [('Data Entry', 5577)]"
    );
    assert_eq!(
        outcome.render(OutputMode::Verbose),
        "SQL: SELECT Job_Category, Earnings_USD FROM freelancer_earnings WHERE Freelancer_ID=4\n\
         Result: [('Data Entry', 5577)]"
    );
    assert_eq!(h.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.audit.records().len(), 2);
}

#[tokio::test]
async fn test_destructive_statement_is_refused() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(
        SqliteStore::new(&db_path),
        "sql",
        Some("DROP TABLE freelancer_earnings"),
    );

    let outcome = h.pipeline.handle("DROP TABLE freelancer_earnings").await;

    assert_eq!(
        outcome.render(OutputMode::AnswerOnly),
        "Error: the generated SQL query is invalid."
    );
    assert_eq!(row_count(&db_path), 10);
}

#[tokio::test]
async fn test_stacked_statement_is_refused() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(
        SqliteStore::new(&db_path),
        "sql",
        Some("SELECT * FROM freelancer_earnings; DROP TABLE freelancer_earnings"),
    );

    let outcome = h.pipeline.handle("Show everything").await;

    assert!(matches!(outcome, Outcome::UnsafeSql { .. }));
    assert_eq!(row_count(&db_path), 10);
}

#[tokio::test]
async fn test_generation_failure_runs_fallback_statement() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(SqliteStore::new(&db_path), "sql", None);

    let outcome = h.pipeline.handle("Average hourly rate?").await;

    assert_eq!(outcome.render(OutputMode::AnswerOnly), "Answer: [(1,)]");
    assert!(h.audit.records().contains(&AuditRecord::Sql {
        question: "Average hourly rate?".to_string(),
        sql: "SELECT 1".to_string(),
        fallback: true,
    }));
}

#[tokio::test]
async fn test_blank_question_makes_no_calls() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(SqliteStore::new(&db_path), "sql", Some("SELECT 1"));

    for question in ["", "   ", "\t\n"] {
        let outcome = h.pipeline.handle(question).await;
        assert_eq!(
            outcome.render(OutputMode::AnswerOnly),
            "The question must not be empty."
        );
    }
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert!(h.audit.records().is_empty());
}

#[tokio::test]
async fn test_missing_database_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        SqliteStore::new(dir.path().join("missing.db")),
        "sql",
        Some("SELECT 1"),
    );

    let outcome = h.pipeline.handle("How many freelancers?").await;

    match &outcome {
        Outcome::Failed { sql: None, error } => assert!(error.starts_with("Schema unavailable")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(outcome.render(OutputMode::AnswerOnly).starts_with("Error: Schema unavailable"));
    // generation is never attempted without a schema
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unrecognised_intent_is_unknown() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(SqliteStore::new(&db_path), "weather", Some("SELECT 1"));

    let outcome = h.pipeline.handle("Will it rain?").await;

    assert_eq!(outcome, Outcome::UnknownIntent);
    assert_eq!(
        outcome.render(OutputMode::AnswerOnly),
        "Could not determine the type of the question."
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_questions_share_one_pipeline() {
    let (_dir, db_path) = fixture_db().await;
    let h = harness(
        SqliteStore::new(&db_path),
        "sql",
        Some("SELECT Job_Category, Earnings_USD FROM freelancer_earnings WHERE Freelancer_ID=4"),
    );
    let (p1, p2, p3, p4) = (
        h.pipeline.clone(),
        h.pipeline.clone(),
        h.pipeline.clone(),
        h.pipeline.clone(),
    );

    let (a, b, c, d) = tokio::join!(
        p1.handle("What did freelancer 4 earn?"),
        p2.handle("Which category is freelancer 4 in?"),
        p3.handle("Earnings of freelancer 4?"),
        p4.handle("Freelancer 4 details"),
    );

    for outcome in [a, b, c, d] {
        assert_eq!(
            outcome.render(OutputMode::AnswerOnly),
            "Answer: [('Data Entry', 5577)]"
        );
    }
    assert_eq!(h.calls.load(Ordering::SeqCst), 8);
    assert_eq!(h.audit.records().len(), 8);
    assert_eq!(row_count(&db_path), 10);
}
