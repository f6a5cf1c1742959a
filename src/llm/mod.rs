//! LLM-powered intent classification and SQL generation.

pub mod assistant;
pub mod client;
pub mod prompts;
pub mod provider;

pub use assistant::{ModelAssistant, QueryAssistant, TEMPERATURE};
pub use client::{HttpModel, LlmProvider, TokenUsage};
pub use provider::{LanguageModel, ResponseShape};
