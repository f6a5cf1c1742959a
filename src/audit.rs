//! Append-only audit trail of model results.
//!
//! Every classification and every SQL generation attempt is recorded for
//! offline review. Recording is best-effort: a sink that can't write logs a
//! warning and the pipeline carries on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::warn;

use crate::types::Intent;

/// What the model produced for a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditRecord {
    /// Intent classification result
    Intent { question: String, intent: Intent },
    /// SQL generation attempt; `fallback` is set when the model failed
    Sql {
        question: String,
        sql: String,
        fallback: bool,
    },
}

/// Audit log collaborator.
///
/// `record` never fails from the caller's point of view.
pub trait AuditLog: Send + Sync {
    fn record(&self, entry: AuditRecord);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditLog;

impl AuditLog for NullAuditLog {
    fn record(&self, _entry: AuditRecord) {}
}

#[derive(Serialize)]
struct Line {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    entry: AuditRecord,
}

fn append(path: &Path, line: &Line) -> std::io::Result<()> {
    let mut bytes = serde_json::to_vec(line)?;
    bytes.push(b'\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    // single write so concurrent appenders don't interleave within a line
    file.write_all(&bytes)
}

/// Appends one JSON object per line to a file.
///
/// `record` only queues the line; a dedicated `audit-log` thread does the
/// file I/O. Dropping the log waits for queued lines to be written.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    sender: Option<UnboundedSender<Line>>,
    writer: Option<JoinHandle<()>>,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Line>();

        let writer_path = path.clone();
        let spawned = thread::Builder::new()
            .name("audit-log".to_string())
            .spawn(move || {
                while let Some(line) = receiver.blocking_recv() {
                    if let Err(e) = append(&writer_path, &line) {
                        warn!(path = %writer_path.display(), error = %e, "Failed to write audit record");
                    }
                }
            });

        match spawned {
            Ok(writer) => Self {
                path,
                sender: Some(sender),
                writer: Some(writer),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Audit writer unavailable, records will be dropped");
                Self {
                    path,
                    sender: None,
                    writer: None,
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for JsonlAuditLog {
    fn record(&self, entry: AuditRecord) {
        let line = Line {
            timestamp: Utc::now(),
            entry,
        };
        let sent = self.sender.as_ref().map(|s| s.send(line).is_ok()).unwrap_or(false);
        if !sent {
            warn!(path = %self.path.display(), "Audit writer stopped, record dropped");
        }
    }
}

impl Drop for JsonlAuditLog {
    fn drop(&mut self) {
        // closing the channel ends the writer loop once the queue is drained
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, entry: AuditRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
