//! Session controller: the orchestrator behind every UI action.
//!
//! Drives the session store, the operation guard, and the two external
//! gateways. The subtle part is reconciliation: an operation records the
//! session key it was started for, and when its result arrives after the
//! user has switched tabs, the result is written into that original
//! session's saved state. The now-current session's display is never
//! touched by a background result.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ChatSettings, SettingsStore};
use crate::content::{ContentProvider, PageContent, PageTarget};
use crate::llm::{GenerateRequest, LLMProvider};
use crate::{prompt, summary};

use super::error::ChatError;
use super::events::{EventSender, NoticeLevel, UiEvent};
use super::guard::{OperationGuard, OperationKind, OperationToken};
use super::{Message, Sender, SessionStore};

#[derive(Clone)]
pub struct SessionController {
    store: SessionStore,
    guard: OperationGuard,
    llm: Arc<dyn LLMProvider>,
    content: Arc<dyn ContentProvider>,
    settings: SettingsStore,
    events: EventSender,
}

impl SessionController {
    pub fn new(
        store: SessionStore,
        guard: OperationGuard,
        llm: Arc<dyn LLMProvider>,
        content: Arc<dyn ContentProvider>,
        settings: SettingsStore,
        events: EventSender,
    ) -> Self {
        Self {
            store,
            guard,
            llm,
            content,
            settings,
            events,
        }
    }

    // ------------------------------------------------------------------
    // Read-side accessors for UI layers
    // ------------------------------------------------------------------

    pub async fn current_key(&self) -> Option<String> {
        self.store.current_key().await
    }

    pub async fn history(&self, key: &str) -> Vec<Message> {
        self.store.history(key).await
    }

    pub async fn has_page(&self, key: &str) -> bool {
        self.store.page(key).await.is_some()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.store.contains(key).await
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Make `key` the session the UI renders.
    ///
    /// An operation started for the previous session keeps running; its
    /// result will land in that session's saved state, not here. The UI is
    /// pushed into a neutral state right away so it never shows stale
    /// content mid-transition.
    pub async fn activate(&self, key: &str, target: PageTarget) {
        let switched = !self.store.is_current(key).await;
        self.store.activate(key, target).await;

        if switched {
            self.events.send(UiEvent::LoadingFinished {
                key: key.to_string(),
            });
            self.events.send(UiEvent::SessionActivated {
                key: key.to_string(),
            });
            debug!(session = %key, "session activated");
        }
    }

    /// Summarize the page attached to `key`.
    ///
    /// On success the session's history is replaced with the summary message
    /// and the extracted page snapshot is cached for follow-up questions.
    pub async fn summarize(&self, key: &str) -> Result<(), ChatError> {
        let settings = self.settings.snapshot().await;
        if settings.api_key.is_empty() {
            self.events.send(UiEvent::Notice {
                level: NoticeLevel::Error,
                text: "Please configure your API key in settings".to_string(),
            });
            return Err(ChatError::Configuration);
        }

        let Some(token) = self.guard.try_acquire(OperationKind::Summarize, key) else {
            self.notify_busy();
            return Err(ChatError::Busy);
        };

        self.events.send(UiEvent::LoadingStarted {
            key: key.to_string(),
            kind: OperationKind::Summarize,
        });

        let result = self.run_summarize(key, &settings).await;
        self.finish_summarize(key, &token, result).await
    }

    async fn run_summarize(
        &self,
        key: &str,
        settings: &ChatSettings,
    ) -> Result<(Message, PageContent), ChatError> {
        let Some(target) = self.store.target(key).await else {
            return Err(ChatError::Extraction(
                "no page associated with this session".to_string(),
            ));
        };

        let page = self
            .content
            .extract(&target)
            .await
            .map_err(|e| ChatError::Extraction(e.to_string()))?;

        let request = GenerateRequest {
            prompt: prompt::summary_prompt(settings.verbosity, &page),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            want_json: true,
        };
        let raw = self
            .llm
            .generate(request)
            .await
            .map_err(|e| ChatError::Generation(e.to_string()))?;

        let message = Message::now(Sender::Assistant, summary::render_response(&raw));
        Ok((message, page))
    }

    /// Apply a finished summarize to whichever session asked for it.
    async fn finish_summarize(
        &self,
        key: &str,
        token: &OperationToken,
        result: Result<(Message, PageContent), ChatError>,
    ) -> Result<(), ChatError> {
        let still_current = self.store.is_current(key).await;
        let quiet = token.is_cancelled() || !still_current;

        match result {
            Ok((message, page)) => {
                self.store.replace(key, message, page).await;
                if !quiet {
                    self.events.send(UiEvent::HistoryReplaced {
                        key: key.to_string(),
                    });
                    self.events.send(UiEvent::LoadingFinished {
                        key: key.to_string(),
                    });
                } else {
                    debug!(session = %key, "summary stored for background session");
                }
                Ok(())
            }
            Err(error) => {
                warn!(session = %key, error = %error, "summarize failed");
                if !quiet {
                    self.events.send(UiEvent::Notice {
                        level: NoticeLevel::Error,
                        text: format!("Error: {error}"),
                    });
                    self.events.send(UiEvent::LoadingFinished {
                        key: key.to_string(),
                    });
                }
                Err(error)
            }
        }
    }

    /// Ask a follow-up question against the session's cached page content.
    ///
    /// A no-op when the question is empty or nothing has been summarized
    /// yet. The user message is appended before the gateway call so the
    /// conversation reads correctly even while the answer is pending; a
    /// failed call appends an assistant-authored error message instead of
    /// surfacing a notification, keeping the conversation intact.
    pub async fn ask(&self, key: &str, question: &str) -> Result<(), ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(());
        }
        let Some(page) = self.store.page(key).await else {
            debug!(session = %key, "ask ignored: no cached page content");
            return Ok(());
        };

        let Some(token) = self.guard.try_acquire(OperationKind::Ask, key) else {
            self.notify_busy();
            return Err(ChatError::Busy);
        };

        let user_message = Message::now(Sender::User, question);
        let appended = self.store.append(key, user_message.clone()).await;
        if appended && self.store.is_current(key).await {
            self.events.send(UiEvent::MessageAppended {
                key: key.to_string(),
                message: user_message,
            });
        }
        self.events.send(UiEvent::LoadingStarted {
            key: key.to_string(),
            kind: OperationKind::Ask,
        });

        let settings = self.settings.snapshot().await;
        let request = GenerateRequest {
            prompt: prompt::question_prompt(question, &page.text),
            api_key: settings.api_key,
            model: settings.model,
            want_json: false,
        };
        let reply = match self.llm.generate(request).await {
            Ok(text) => text,
            Err(error) => {
                warn!(session = %key, error = %error, "ask failed");
                format!("Sorry, I encountered an error: {error}")
            }
        };

        let still_current = self.store.is_current(key).await;
        let quiet = token.is_cancelled() || !still_current;
        let assistant_message = Message::now(Sender::Assistant, reply);
        let appended = self.store.append(key, assistant_message.clone()).await;

        if appended && still_current {
            self.store.save_working().await;
            if !quiet {
                self.events.send(UiEvent::MessageAppended {
                    key: key.to_string(),
                    message: assistant_message,
                });
                self.events.send(UiEvent::LoadingFinished {
                    key: key.to_string(),
                });
            }
        } else if !appended {
            debug!(session = %key, "discarded reply for a session that no longer exists");
        }

        Ok(())
    }

    /// Best-effort cancel for `key`.
    ///
    /// There is no way to abort a dispatched external call: the live token
    /// is flagged so the eventual result is applied without UI reaction,
    /// and the cached page content is dropped so follow-up questions stop
    /// until the next summarize.
    pub async fn cancel(&self, key: &str) {
        let flagged = self.guard.cancel_for(key);
        self.store.clear_page(key).await;
        if self.store.is_current(key).await {
            self.events.send(UiEvent::LoadingFinished {
                key: key.to_string(),
            });
        }
        if flagged {
            debug!(session = %key, "in-flight operation flagged as cancelled");
        }
    }

    /// Evict the session for a closed tab.
    pub async fn close(&self, key: &str) {
        self.store.close(key).await;
        debug!(session = %key, "session closed");
    }

    fn notify_busy(&self) {
        self.events.send(UiEvent::Notice {
            level: NoticeLevel::Error,
            text: "Please wait for the current operation to complete".to_string(),
        });
    }
}
