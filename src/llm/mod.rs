//! LLM gateway for text generation.

mod error;
mod gemini;
mod provider;

pub use error::LLMError;
pub use gemini::GeminiProvider;
pub use provider::{GenerateRequest, LLMProvider};
