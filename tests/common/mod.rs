//! Common test utilities: scriptable gateways and a wired-up controller.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc};

use axum::Router;

use glimpse::config::{ChatSettings, SettingsStore};
use glimpse::content::{ContentError, ContentProvider, PageContent, PageTarget};
use glimpse::llm::{GenerateRequest, LLMError, LLMProvider};
use glimpse::server::{self, AppState};
use glimpse::session::{
    OperationGuard, SessionController, SessionStore, UiEvent, ui_channel,
};

/// Content provider that always succeeds, deriving the snapshot from the URL.
pub struct StaticContent;

#[async_trait]
impl ContentProvider for StaticContent {
    async fn extract(&self, target: &PageTarget) -> Result<PageContent, ContentError> {
        Ok(PageContent {
            title: "Example Page".to_string(),
            text: format!("Body text for {}", target.url),
            url: target.url.clone(),
        })
    }
}

/// Content provider that always fails.
pub struct FailingContent;

#[async_trait]
impl ContentProvider for FailingContent {
    async fn extract(&self, _target: &PageTarget) -> Result<PageContent, ContentError> {
        Err(ContentError::Unreadable("no readable text".to_string()))
    }
}

/// LLM provider that plays back a scripted sequence of replies.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for ScriptedGenerator {
    async fn generate(&self, _request: GenerateRequest) -> Result<String, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("fallback reply".to_string()));
        next.map_err(|message| LLMError::Api {
            status: 500,
            message,
        })
    }
}

/// LLM provider whose reply is held back until the test releases the gate.
///
/// Signals on `entered` when a generate call starts, then waits for a permit.
pub struct GatedGenerator {
    reply: String,
    entered: mpsc::UnboundedSender<()>,
    gate: Arc<Semaphore>,
}

impl GatedGenerator {
    pub fn new(reply: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<()>, Arc<Semaphore>) {
        let (entered_tx, entered_rx) = mpsc::unbounded_channel();
        let gate = Arc::new(Semaphore::new(0));
        let generator = Arc::new(Self {
            reply: reply.to_string(),
            entered: entered_tx,
            gate: gate.clone(),
        });
        (generator, entered_rx, gate)
    }
}

#[async_trait]
impl LLMProvider for GatedGenerator {
    async fn generate(&self, _request: GenerateRequest) -> Result<String, LLMError> {
        let _ = self.entered.send(());
        let permit = self.gate.acquire().await.map_err(|_| LLMError::Api {
            status: 499,
            message: "gate closed".to_string(),
        })?;
        permit.forget();
        Ok(self.reply.clone())
    }
}

/// A controller wired to test doubles, with handles to everything around it.
pub struct Harness {
    pub controller: SessionController,
    pub store: SessionStore,
    pub guard: OperationGuard,
    pub events: mpsc::UnboundedReceiver<UiEvent>,
    pub settings: SettingsStore,
}

pub fn harness(llm: Arc<dyn LLMProvider>, content: Arc<dyn ContentProvider>) -> Harness {
    let store = SessionStore::new();
    let guard = OperationGuard::new();
    let settings = SettingsStore::new(ChatSettings {
        api_key: "sk-test".to_string(),
        ..ChatSettings::default()
    });
    let (events_tx, events_rx) = ui_channel();
    let controller = SessionController::new(
        store.clone(),
        guard.clone(),
        llm,
        content,
        settings.clone(),
        events_tx,
    );

    Harness {
        controller,
        store,
        guard,
        events: events_rx,
        settings,
    }
}

/// Create a test app backed by the given gateways.
pub fn test_app(llm: Arc<dyn LLMProvider>, content: Arc<dyn ContentProvider>) -> Router {
    let h = harness(llm, content);
    server::build_app(AppState { controller: h.controller }, 30)
}

/// Drain every event currently in the channel.
pub fn drain_events(events: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

pub fn target(url: &str) -> PageTarget {
    PageTarget::new(url)
}

/// A structured response in the shape the summary prompt asks for.
pub const STRUCTURED_REPLY: &str = r#"{"mainIdea":"X","summary":["a","b"],"conclusion":"Y","followUpQuestions":["Q1?","Q2?"]}"#;
