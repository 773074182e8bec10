//! Session operation errors.

use thiserror::Error;

/// Errors surfaced by session operations.
///
/// These never escape the controller in a way that breaks the system: every
/// failure leaves the store usable for the next user action, and the guard is
/// released on every path.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key is configured; the user must open settings first.
    #[error("no API key configured")]
    Configuration,

    /// Another operation is already in flight.
    #[error("another operation is already in progress")]
    Busy,

    /// The content provider could not produce a page snapshot.
    #[error("content extraction failed: {0}")]
    Extraction(String),

    /// The LLM gateway failed.
    #[error("generation failed: {0}")]
    Generation(String),
}
