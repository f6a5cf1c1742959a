//! HTTP client for hosted language models with structured output.

use crate::config::LlmConfig;
use crate::llm::provider::{LanguageModel, ResponseShape};
use crate::otel::record_token_usage;
use crate::types::{AnalyticsError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tracing::debug;

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Pick the provider from the model name.
    ///
    /// `gpt-*`, `o1*`, `o3*` → OpenAI, `claude*` → Anthropic, anything else → Gemini.
    pub fn from_model(model: &str) -> Self {
        if model.starts_with("claude") || model.starts_with("anthropic") {
            LlmProvider::Anthropic
        } else if model.starts_with("gpt") || model.starts_with("o1") || model.starts_with("o3") {
            LlmProvider::OpenAI
        } else {
            LlmProvider::Gemini
        }
    }

    /// Provider name, as used in `gen_ai.system`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Token counts reported by the provider, when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

/// Hosted model reached over HTTPS.
pub struct HttpModel {
    api_key: String,
    model: String,
    provider: LlmProvider,
    client: Client,
}

/// Gemini `generateContent` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

/// OpenAI chat completion response.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

/// Anthropic messages response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

impl HttpModel {
    /// Strip markdown code fences from a model response.
    ///
    /// Handles ```` ```json ... ``` ```` and bare ```` ``` ... ``` ````.
    pub fn strip_markdown(text: &str) -> String {
        let text = text.trim();

        if text.starts_with("```") {
            let start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
            let end = text.rfind("```").filter(|&e| e >= start).unwrap_or(text.len());
            return text[start..end].trim().to_string();
        }

        text.to_string()
    }

    /// Create new model client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Provider API key
    /// * `model` - Model name (e.g., "gemini-2.0-flash", "gpt-4o-mini", "claude-3-5-haiku-latest")
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::HttpError` if the HTTP client can't be built
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let provider = LlmProvider::from_model(&model);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            model,
            provider,
            client,
        })
    }

    /// Create from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::ConfigError` if the provider's API key is not set
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Self::new(api_key, config.model.clone(), config.timeout)
    }

    /// Provider this client talks to.
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Send a request and return the response body, failing on non-2xx.
    async fn post(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| AnalyticsError::llm(format!("{} API error: {}", self.provider.as_str(), e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalyticsError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AnalyticsError::llm(format!(
                "{} API error {}: {}",
                self.provider.as_str(),
                status,
                body
            )));
        }

        Ok(body)
    }

    /// Call Gemini `generateContent` with a response schema.
    async fn call_gemini(
        &self,
        prompt: &str,
        shape: &ResponseShape,
        temperature: f32,
    ) -> Result<(String, TokenUsage)> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [
                    {"role": "user", "parts": [{"text": prompt}]}
                ],
                "generationConfig": {
                    "temperature": temperature,
                    "responseMimeType": "application/json",
                    "responseSchema": shape.gemini_schema()
                }
            }));

        parse_gemini(&self.post(request).await?)
    }

    /// Call OpenAI chat completions with strict JSON schema.
    async fn call_openai(
        &self,
        prompt: &str,
        shape: &ResponseShape,
        temperature: f32,
    ) -> Result<(String, TokenUsage)> {
        let request = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "user", "content": prompt}
                ],
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {
                        "name": shape.name,
                        "strict": true,
                        "schema": shape.json_schema()
                    }
                },
                "temperature": temperature
            }));

        parse_openai(&self.post(request).await?)
    }

    /// Call Anthropic messages API. The schema goes in the system prompt.
    async fn call_anthropic(
        &self,
        prompt: &str,
        shape: &ResponseShape,
        temperature: f32,
    ) -> Result<(String, TokenUsage)> {
        let system = format!(
            "Respond with a single JSON object matching this JSON Schema, with no markdown and no text outside the JSON:\n{}",
            shape.json_schema()
        );
        let request = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": 1024,
                "system": system,
                "messages": [
                    {"role": "user", "content": prompt}
                ],
                "temperature": temperature
            }));

        let (text, usage) = parse_anthropic(&self.post(request).await?)?;
        Ok((Self::strip_markdown(&text), usage))
    }
}

fn parse_gemini(body: &str) -> Result<(String, TokenUsage)> {
    let parsed: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| AnalyticsError::llm(format!("Failed to parse Gemini response: {}", e)))?;

    let candidate = parsed
        .candidates
        .first()
        .ok_or_else(|| AnalyticsError::llm("No candidates in Gemini response"))?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(AnalyticsError::llm(format!(
            "Empty Gemini candidate (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    let usage = parsed
        .usage_metadata
        .map(|u| TokenUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok((text, usage))
}

fn parse_openai(body: &str) -> Result<(String, TokenUsage)> {
    let parsed: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| AnalyticsError::llm(format!("Failed to parse OpenAI response: {}", e)))?;

    let text = parsed
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .ok_or_else(|| AnalyticsError::llm("No response from OpenAI"))?;

    let usage = parsed
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok((text, usage))
}

fn parse_anthropic(body: &str) -> Result<(String, TokenUsage)> {
    let parsed: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| AnalyticsError::llm(format!("Failed to parse Anthropic response: {}", e)))?;

    let text = parsed
        .content
        .iter()
        .find_map(|c| c.text.clone())
        .ok_or_else(|| AnalyticsError::llm("No response from Anthropic"))?;

    let usage = parsed
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();

    Ok((text, usage))
}

/// Parse the model's text as a JSON object.
fn parse_object(text: &str) -> Result<JsonValue> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| AnalyticsError::llm(format!("Model returned invalid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(AnalyticsError::llm(format!(
            "Model returned JSON that is not an object: {}",
            value
        )));
    }
    Ok(value)
}

#[async_trait]
impl LanguageModel for HttpModel {
    async fn generate_structured(
        &self,
        prompt: &str,
        shape: &ResponseShape,
        temperature: f32,
    ) -> Result<JsonValue> {
        let (text, usage) = match self.provider {
            LlmProvider::Gemini => self.call_gemini(prompt, shape, temperature).await?,
            LlmProvider::OpenAI => self.call_openai(prompt, shape, temperature).await?,
            LlmProvider::Anthropic => self.call_anthropic(prompt, shape, temperature).await?,
        };

        record_token_usage(usage.input_tokens, usage.output_tokens);
        debug!(provider = self.provider.as_str(), raw = %text, "Model raw response");

        parse_object(&text)
    }

    fn provider_name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_model() {
        assert_eq!(LlmProvider::from_model("gemini-2.0-flash"), LlmProvider::Gemini);
        assert_eq!(LlmProvider::from_model("gpt-4o-mini"), LlmProvider::OpenAI);
        assert_eq!(LlmProvider::from_model("claude-3-5-haiku-latest"), LlmProvider::Anthropic);
        assert_eq!(LlmProvider::from_model("some-local-model"), LlmProvider::Gemini);
    }

    #[test]
    fn test_strip_markdown() {
        assert_eq!(HttpModel::strip_markdown("```json\n{\"sql\": \"SELECT 1\"}\n```"), "{\"sql\": \"SELECT 1\"}");
        assert_eq!(HttpModel::strip_markdown("```\n{}\n```"), "{}");
        assert_eq!(HttpModel::strip_markdown("  {\"intent\": \"sql\"} "), "{\"intent\": \"sql\"}");
    }

    #[test]
    fn test_parse_gemini() {
        let body = r#"{
            "candidates": [{"content": {"parts": [{"text": "{\"intent\": \"sql\"}"}], "role": "model"}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 7, "totalTokenCount": 127}
        }"#;

        let (text, usage) = parse_gemini(body).unwrap();
        assert_eq!(text, "{\"intent\": \"sql\"}");
        assert_eq!(usage.input_tokens, Some(120));
        assert_eq!(usage.output_tokens, Some(7));
    }

    #[test]
    fn test_parse_gemini_blocked_candidate() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let err = parse_gemini(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_openai() {
        let body = r#"{
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"sql\": \"SELECT 1\"}"}}],
            "usage": {"prompt_tokens": 50, "completion_tokens": 9}
        }"#;

        let (text, usage) = parse_openai(body).unwrap();
        assert_eq!(text, "{\"sql\": \"SELECT 1\"}");
        assert_eq!(usage.output_tokens, Some(9));
    }

    #[test]
    fn test_parse_anthropic() {
        let body = r#"{"content": [{"type": "text", "text": "{\"intent\": \"help\"}"}], "usage": {"input_tokens": 40, "output_tokens": 6}}"#;

        let (text, usage) = parse_anthropic(body).unwrap();
        assert_eq!(text, "{\"intent\": \"help\"}");
        assert_eq!(usage.input_tokens, Some(40));
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object("{\"sql\": \"SELECT 1\"}").is_ok());
        assert!(parse_object("[\"SELECT 1\"]").is_err());
        assert!(parse_object("SELECT 1").is_err());
    }
}
