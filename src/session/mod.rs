//! Per-tab chat sessions.
//!
//! A session is the conversational state tied to one browser tab: its chat
//! history plus the page snapshot the chat is grounded on. The store keeps a
//! live working copy for the currently displayed session and a map of saved
//! sessions for every other tab; switching tabs persists the outgoing working
//! copy before loading the incoming one.

mod controller;
mod error;
mod events;
mod guard;

pub use controller::SessionController;
pub use error::ChatError;
pub use events::{EventSender, NoticeLevel, UiEvent, ui_channel};
pub use guard::{OperationGuard, OperationKind, OperationToken};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::content::{PageContent, PageTarget};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn now(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }
}

/// The conversational state of one tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub messages: Vec<Message>,
    /// Extracted page snapshot; present once a summarize has completed.
    pub page: Option<PageContent>,
    /// The page this session is attached to, set on activation.
    pub target: Option<PageTarget>,
}

#[derive(Default)]
struct StoreInner {
    sessions: HashMap<String, Session>,
    current_key: Option<String>,
    working: Session,
}

/// In-memory session store, keyed by an opaque per-tab session key.
///
/// Only the [`SessionController`] mutates it; everything here is plain data
/// movement with no side effects.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl SessionStore {
    /// Create a new empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The key of the session the UI is currently rendering.
    pub async fn current_key(&self) -> Option<String> {
        self.inner.read().await.current_key.clone()
    }

    pub async fn is_current(&self, key: &str) -> bool {
        self.inner.read().await.current_key.as_deref() == Some(key)
    }

    /// Make `key` the current session.
    ///
    /// Persists the outgoing working copy under its key, then loads the saved
    /// session for `key` or lazily creates an empty one. Activating the key
    /// that is already current only refreshes its page target.
    pub async fn activate(&self, key: &str, target: PageTarget) -> Session {
        let mut inner = self.inner.write().await;

        if inner.current_key.as_deref() == Some(key) {
            inner.working.target = Some(target);
            return inner.working.clone();
        }

        if let Some(old_key) = inner.current_key.take() {
            let outgoing = std::mem::take(&mut inner.working);
            inner.sessions.insert(old_key, outgoing);
        }

        let mut session = inner.sessions.get(key).cloned().unwrap_or_default();
        session.target = Some(target);
        inner.current_key = Some(key.to_string());
        inner.working = session.clone();
        session
    }

    /// Message history for `key`: the working copy when current, the saved
    /// session otherwise. Unknown keys yield an empty history.
    pub async fn history(&self, key: &str) -> Vec<Message> {
        let inner = self.inner.read().await;
        if inner.current_key.as_deref() == Some(key) {
            inner.working.messages.clone()
        } else {
            inner
                .sessions
                .get(key)
                .map(|s| s.messages.clone())
                .unwrap_or_default()
        }
    }

    pub async fn page(&self, key: &str) -> Option<PageContent> {
        let inner = self.inner.read().await;
        if inner.current_key.as_deref() == Some(key) {
            inner.working.page.clone()
        } else {
            inner.sessions.get(key).and_then(|s| s.page.clone())
        }
    }

    pub async fn target(&self, key: &str) -> Option<PageTarget> {
        let inner = self.inner.read().await;
        if inner.current_key.as_deref() == Some(key) {
            inner.working.target.clone()
        } else {
            inner.sessions.get(key).and_then(|s| s.target.clone())
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        let inner = self.inner.read().await;
        inner.current_key.as_deref() == Some(key) || inner.sessions.contains_key(key)
    }

    /// Append a message to the session for `key`.
    ///
    /// Writes to the working copy when `key` is current; otherwise to the
    /// saved session, skipping (and returning false) when none exists.
    pub async fn append(&self, key: &str, message: Message) -> bool {
        let mut inner = self.inner.write().await;
        if inner.current_key.as_deref() == Some(key) {
            inner.working.messages.push(message);
            true
        } else if let Some(session) = inner.sessions.get_mut(key) {
            session.messages.push(message);
            true
        } else {
            false
        }
    }

    /// Apply a completed summarize: replace the whole history with the one
    /// summary message and store the page snapshot.
    ///
    /// A saved session is created if `key` has none, so a summary can land in
    /// a tab the user has navigated away from.
    pub async fn replace(&self, key: &str, message: Message, page: PageContent) {
        let mut inner = self.inner.write().await;
        if inner.current_key.as_deref() == Some(key) {
            inner.working.messages = vec![message];
            inner.working.page = Some(page);
            let copy = inner.working.clone();
            inner.sessions.insert(key.to_string(), copy);
        } else {
            let session = inner.sessions.entry(key.to_string()).or_default();
            session.messages = vec![message];
            session.page = Some(page);
        }
    }

    /// Persist the working copy under the current key.
    pub async fn save_working(&self) {
        let mut inner = self.inner.write().await;
        if let Some(key) = inner.current_key.clone() {
            let copy = inner.working.clone();
            inner.sessions.insert(key, copy);
        }
    }

    /// Drop the cached page snapshot for `key`.
    pub async fn clear_page(&self, key: &str) {
        let mut inner = self.inner.write().await;
        if inner.current_key.as_deref() == Some(key) {
            inner.working.page = None;
        } else if let Some(session) = inner.sessions.get_mut(key) {
            session.page = None;
        }
    }

    /// Evict a session whose tab has closed.
    pub async fn close(&self, key: &str) {
        let mut inner = self.inner.write().await;
        inner.sessions.remove(key);
        if inner.current_key.as_deref() == Some(key) {
            inner.current_key = None;
            inner.working = Session::default();
        }
    }
}
