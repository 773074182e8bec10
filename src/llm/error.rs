//! LLM error types.

use thiserror::Error;

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// No API key was supplied with the request.
    #[error("API key not provided")]
    NoApiKey,

    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// API returned a response with no usable text.
    #[error("api response contained no text")]
    EmptyResponse,
}
