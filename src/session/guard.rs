//! Single-slot operation guard.
//!
//! At most one summarize/ask may be in flight across ALL sessions: the
//! upstream API and extraction calls are rate- and UI-sensitive, and two
//! concurrent calls would interleave chat output and double-bill the user's
//! API key. A refused acquire is a pure rejection; callers retry later.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// The kind of operation holding the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Summarize,
    Ask,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Summarize => write!(f, "summarize"),
            OperationKind::Ask => write!(f, "ask"),
        }
    }
}

#[derive(Debug)]
struct LiveOperation {
    kind: OperationKind,
    session_key: String,
    cancelled: Arc<AtomicBool>,
}

type Slot = Arc<Mutex<Option<LiveOperation>>>;

/// Guard with a single live-operation slot shared across all sessions.
#[derive(Clone, Default)]
pub struct OperationGuard {
    slot: Slot,
}

impl OperationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the slot. Refused whenever any operation is live,
    /// regardless of which session it targets.
    pub fn try_acquire(&self, kind: OperationKind, session_key: &str) -> Option<OperationToken> {
        let mut slot = lock(&self.slot);
        if slot.is_some() {
            return None;
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        *slot = Some(LiveOperation {
            kind,
            session_key: session_key.to_string(),
            cancelled: cancelled.clone(),
        });

        Some(OperationToken {
            slot: self.slot.clone(),
            cancelled,
            kind,
            session_key: session_key.to_string(),
        })
    }

    /// Flag the live operation as cancelled if it targets `session_key`.
    ///
    /// There is no way to abort the dispatched external call; the flag only
    /// tells the operation to apply its eventual result quietly.
    pub fn cancel_for(&self, session_key: &str) -> bool {
        let slot = lock(&self.slot);
        match slot.as_ref() {
            Some(live) if live.session_key == session_key => {
                live.cancelled.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// The live operation, if any.
    pub fn live(&self) -> Option<(OperationKind, String)> {
        lock(&self.slot)
            .as_ref()
            .map(|live| (live.kind, live.session_key.clone()))
    }
}

fn lock(slot: &Slot) -> std::sync::MutexGuard<'_, Option<LiveOperation>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Proof of the claimed slot. Dropping the token releases the slot, so the
/// guard is freed on every exit path of an operation, errors included.
pub struct OperationToken {
    slot: Slot,
    cancelled: Arc<AtomicBool>,
    kind: OperationKind,
    session_key: String,
}

impl OperationToken {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for OperationToken {
    fn drop(&mut self) {
        *lock(&self.slot) = None;
    }
}
