//! What a question ends in, and how that is shown to the user.

use crate::types::ResultSet;
use std::fmt::Write as _;

pub const BLANK_INPUT_MSG: &str = "The question must not be empty.";
pub const SMALLTALK_MSG: &str = "This is an informal question unrelated to analytics.";
pub const HELP_MSG: &str = "For help, use the --help option.";
pub const UNKNOWN_INTENT_MSG: &str = "Could not determine the type of the question.";
pub const UNSAFE_SQL_MSG: &str = "Error: the generated SQL query is invalid.";

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Question was empty after trimming
    BlankInput,
    SmallTalk,
    Help,
    UnknownIntent,
    /// Statement ran and produced `rows`
    Answered { sql: String, rows: ResultSet },
    /// Statement was refused by the safety gate
    UnsafeSql { sql: String },
    /// Schema or execution failure; `sql` is set once a statement exists
    Failed { sql: Option<String>, error: String },
}

/// How much of an outcome to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Generated SQL followed by the result
    Verbose,
    /// Just the answer
    AnswerOnly,
}

impl Outcome {
    /// User-facing text, one line per item.
    pub fn render(&self, mode: OutputMode) -> String {
        let mut out = String::new();

        if mode == OutputMode::Verbose {
            if let Some(sql) = self.sql() {
                let _ = writeln!(out, "SQL: {}", sql);
            }
        }

        match self {
            Self::BlankInput => out.push_str(BLANK_INPUT_MSG),
            Self::SmallTalk => out.push_str(SMALLTALK_MSG),
            Self::Help => out.push_str(HELP_MSG),
            Self::UnknownIntent => out.push_str(UNKNOWN_INTENT_MSG),
            Self::Answered { rows, .. } => {
                let label = match mode {
                    OutputMode::Verbose => "Result",
                    OutputMode::AnswerOnly => "Answer",
                };
                let _ = write!(out, "{}: {}", label, rows);
            }
            Self::UnsafeSql { .. } => out.push_str(UNSAFE_SQL_MSG),
            Self::Failed { error, .. } => {
                let _ = write!(out, "Error: {}", error);
            }
        }
        out
    }

    /// Statement text, if one was generated.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Answered { sql, .. } | Self::UnsafeSql { sql } => Some(sql),
            Self::Failed { sql, .. } => sql.as_deref(),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BlankInput => "blank_input",
            Self::SmallTalk => "smalltalk",
            Self::Help => "help",
            Self::UnknownIntent => "unknown",
            Self::Answered { .. } => "answered",
            Self::UnsafeSql { .. } => "unsafe_sql",
            Self::Failed { .. } => "failed",
        }
    }
}
