//! Values flowing through the question pipeline.
//!
//! A question moves through these forms:
//! - `Intent`: what kind of question it is
//! - `CandidateStatement`: untrusted SQL text from the generator
//! - `ValidatedStatement`: SQL text that passed the safety gate
//! - `ResultSet`: rows returned by the store

use serde::{Deserialize, Serialize};
use std::fmt;

/// Question intent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Needs an SQL query against the earnings table
    Sql,
    /// Informal question unrelated to analytics
    Smalltalk,
    /// Request for help using the system
    Help,
    /// Could not determine
    Unknown,
}

impl Intent {
    /// Interpret raw model output.
    ///
    /// Trims and lower-cases before matching; anything outside the
    /// enumeration is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "sql" => Self::Sql,
            "smalltalk" => Self::Smalltalk,
            "help" => Self::Help,
            _ => Self::Unknown,
        }
    }

    /// Get intent name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Smalltalk => "smalltalk",
            Self::Help => "help",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL text produced by the generator. Untrusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStatement(String);

impl CandidateStatement {
    /// Statement returned when generation fails.
    pub const FALLBACK: &'static str = "SELECT 1";

    /// Wrap generator output.
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// The degraded statement used when the model is unavailable.
    pub fn fallback() -> Self {
        Self(Self::FALLBACK.to_string())
    }

    /// Raw statement text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statement that passed every safety rule.
///
/// Only `sql::validator` constructs these, so holding one proves the
/// text went through the gate. The text is the candidate's, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStatement(String);

impl ValidatedStatement {
    pub(crate) fn new(candidate: CandidateStatement) -> Self {
        Self(candidate.0)
    }

    /// Executable statement text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Column name and declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// Table description used as model grounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescription {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

impl fmt::Display for SchemaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table {} has the following columns:", self.table)?;
        for column in &self.columns {
            write!(f, "\n- {}: {}", column.name, column.declared_type)?;
        }
        Ok(())
    }
}

/// Scalar value read from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Integer(v) => write!(f, "{}", v),
            // whole reals keep a trailing ".0" so they read differently from integers
            Self::Real(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Self::Real(v) => write!(f, "{}", v),
            Self::Text(s) => write_quoted(f, s),
            Self::Blob(bytes) => {
                f.write_str("b'")?;
                for b in bytes {
                    write!(f, "{}", std::ascii::escape_default(*b))?;
                }
                f.write_str("'")
            }
        }
    }
}

/// Quote text the way Python's `repr` does: single quotes unless the text
/// contains a single quote and no double quote.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    write!(f, "{}", quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}

/// One result row.
pub type Row = Vec<Value>;

/// Rows returned by the store, in natural order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders as a list of tuples, e.g. `[('Data Entry', 5577)]`.
impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str("(")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", value)?;
            }
            if row.len() == 1 {
                f.write_str(",")?;
            }
            f.write_str(")")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_parse_normalizes() {
        assert_eq!(Intent::parse("sql"), Intent::Sql);
        assert_eq!(Intent::parse("  SQL\n"), Intent::Sql);
        assert_eq!(Intent::parse("SmallTalk"), Intent::Smalltalk);
        assert_eq!(Intent::parse("help "), Intent::Help);
        assert_eq!(Intent::parse("unknown"), Intent::Unknown);
        assert_eq!(Intent::parse("weather"), Intent::Unknown);
        assert_eq!(Intent::parse(""), Intent::Unknown);
    }

    #[test]
    fn test_schema_description_format() {
        let schema = SchemaDescription {
            table: "freelancer_earnings".to_string(),
            columns: vec![
                ColumnInfo::new("Freelancer_ID", "INTEGER"),
                ColumnInfo::new("Job_Category", "TEXT"),
            ],
        };

        assert_eq!(
            schema.to_string(),
            "Table freelancer_earnings has the following columns:\n- Freelancer_ID: INTEGER\n- Job_Category: TEXT"
        );
    }

    #[test]
    fn test_result_set_display() {
        let rows = ResultSet::new(vec![vec![Value::from("Data Entry"), Value::from(5577_i64)]]);
        assert_eq!(rows.to_string(), "[('Data Entry', 5577)]");

        let single = ResultSet::new(vec![vec![Value::from("Digital Marketing")]]);
        assert_eq!(single.to_string(), "[('Digital Marketing',)]");

        let mixed = ResultSet::new(vec![vec![Value::Null, Value::Real(4.0), Value::Real(0.25)]]);
        assert_eq!(mixed.to_string(), "[(None, 4.0, 0.25)]");

        assert_eq!(ResultSet::default().to_string(), "[]");
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(Value::from("it's").to_string(), "\"it's\"");
        assert_eq!(Value::from("say \"hi\"").to_string(), "'say \"hi\"'");
        assert_eq!(Value::from("it's \"x\"").to_string(), "'it\\'s \"x\"'");
        assert_eq!(Value::from("a\\b\nc").to_string(), "'a\\\\b\\nc'");
    }

    #[test]
    fn test_validated_statement_preserves_text() {
        let candidate = CandidateStatement::new("  Select * From T;  ");
        let validated = ValidatedStatement::new(candidate.clone());
        assert_eq!(validated.as_str(), candidate.as_str());
    }
}
