//! LLM provider trait.

use async_trait::async_trait;

use super::error::LLMError;

/// A single text-generation request.
///
/// Credentials and model are carried per request: the caller reads them from
/// settings at call time, so they are never cached longer than one call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub api_key: String,
    pub model: String,
    /// Ask the API to return JSON instead of prose.
    pub want_json: bool,
}

/// Trait for LLM providers.
///
/// The returned text is opaque to callers; whether it is prose or JSON is
/// between the prompt and whoever parses the result.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LLMError>;
}
