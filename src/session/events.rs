//! State-change notifications for a presentation layer.

use tokio::sync::mpsc;

use super::Message;
use super::guard::OperationKind;

/// Notifications the controller emits as session state changes.
///
/// Carried over an unbounded channel; the UI layer owns the receiver and
/// decides how to render. Results that land in a session the user has
/// switched away from emit nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SessionActivated { key: String },
    LoadingStarted { key: String, kind: OperationKind },
    LoadingFinished { key: String },
    MessageAppended { key: String, message: Message },
    /// The whole history was replaced (summarize is a reset, not an append).
    HistoryReplaced { key: String },
    Notice { level: NoticeLevel, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Sending half of the UI event channel.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl EventSender {
    /// Emit an event. A missing receiver is fine; headless embedders may
    /// drop theirs.
    pub fn send(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

/// Create the UI event channel.
pub fn ui_channel() -> (EventSender, mpsc::UnboundedReceiver<UiEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}
