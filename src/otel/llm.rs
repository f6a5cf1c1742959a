//! Language model call instrumentation.
//!
//! Model calls are remote clients, so they use `CLIENT` span kind and the
//! `gen_ai.*` attribute names.

use tracing::{span, Level, Span};

/// Model call purposes (maps to `gen_ai.operation.name`).
#[derive(Debug, Clone, Copy)]
pub enum LlmOperation {
    /// Intent classification
    DetectIntent,
    /// SQL generation
    GenerateSql,
}

impl LlmOperation {
    /// Get operation name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DetectIntent => "detect_intent",
            Self::GenerateSql => "generate_sql",
        }
    }
}

/// Create model call span.
///
/// # Arguments
///
/// * `operation` - What the call is for
/// * `system` - Provider name (`gemini`, `openai`, `anthropic`)
/// * `model` - Model name
pub fn llm_span(operation: LlmOperation, system: &str, model: &str) -> Span {
    span!(
        Level::INFO,
        "llm",
        otel.name = %format!("{} {}", operation.as_str(), model),
        otel.kind = "client",
        gen_ai.system = system,
        gen_ai.operation.name = operation.as_str(),
        gen_ai.request.model = model,
        gen_ai.usage.input_tokens = tracing::field::Empty,
        gen_ai.usage.output_tokens = tracing::field::Empty,
    )
}

/// Record token usage on the current span, when the provider reported it.
pub fn record_token_usage(input_tokens: Option<u32>, output_tokens: Option<u32>) {
    let span = Span::current();
    if let Some(input) = input_tokens {
        span.record("gen_ai.usage.input_tokens", input);
    }
    if let Some(output) = output_tokens {
        span.record("gen_ai.usage.output_tokens", output);
    }
}
