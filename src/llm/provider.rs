//! Language model trait and structured response shapes.

use crate::types::Result;
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

/// Shape of a structured model response: an object with one string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseShape {
    /// Schema name (used by providers that require one)
    pub name: &'static str,
    /// The single required string field
    pub field: &'static str,
}

impl ResponseShape {
    /// `{"intent": "..."}`
    pub const INTENT: ResponseShape = ResponseShape {
        name: "intent_response",
        field: "intent",
    };

    /// `{"sql": "..."}`
    pub const SQL: ResponseShape = ResponseShape {
        name: "sql_response",
        field: "sql",
    };

    /// JSON Schema for OpenAI-style strict structured output.
    pub fn json_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                self.field: {"type": "string"}
            },
            "required": [self.field],
            "additionalProperties": false
        })
    }

    /// Gemini `responseSchema` (OpenAPI subset, upper-case type names).
    pub fn gemini_schema(&self) -> JsonValue {
        json!({
            "type": "OBJECT",
            "properties": {
                self.field: {"type": "STRING"}
            },
            "required": [self.field]
        })
    }
}

/// Language model collaborator.
///
/// Implementations send `prompt` and return the model's JSON object. They
/// don't check the object against `shape` beyond asking the provider to
/// honour it; callers deserialize and treat mismatches as failures.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a JSON object shaped like `shape`.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::LlmError` if the request fails or the
    /// response is not a JSON object
    async fn generate_structured(
        &self,
        prompt: &str,
        shape: &ResponseShape,
        temperature: f32,
    ) -> Result<JsonValue>;

    /// Provider name for instrumentation.
    fn provider_name(&self) -> &str {
        "unknown"
    }

    /// Model name for instrumentation.
    fn model_name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_single_field() {
        let schema = ResponseShape::SQL.json_schema();
        assert_eq!(schema["properties"]["sql"]["type"], "string");
        assert_eq!(schema["required"], json!(["sql"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_gemini_schema_types() {
        let schema = ResponseShape::INTENT.gemini_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["intent"]["type"], "STRING");
    }
}
