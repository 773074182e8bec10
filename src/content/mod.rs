//! Page content extraction.
//!
//! The session controller only consumes the [`ContentProvider`] trait; the
//! bundled [`HttpContentProvider`] is the simplest collaborator that makes
//! the CLI and server usable outside a browser.

mod fetch;

pub use fetch::HttpContentProvider;

use async_trait::async_trait;
use thiserror::Error;

/// The page a session is attached to, supplied when the session is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub url: String,
    pub title: Option<String>,
}

impl PageTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }
}

/// A readable-page snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Errors that can occur while extracting page content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Page responded with a non-success status.
    #[error("page fetch failed (status {0})")]
    Status(u16),

    /// The page yielded no readable text.
    #[error("{0}")]
    Unreadable(String),
}

/// Trait for page content providers.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn extract(&self, target: &PageTarget) -> Result<PageContent, ContentError>;
}
