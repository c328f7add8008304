//! Change notifications for live-updating views.
//!
//! Best-effort broadcast: nothing is persisted, late subscribers get no
//! replay, and a slow subscriber simply lags and loses events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::models::EntityKind;

/// Buffered events per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

/// One category of one drama changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub project_id: String,
    pub category: EntityKind,
}

/// Observer interface injected into the differ.
pub trait ChangeSink: Send + Sync {
    /// Fire-and-forget. Must not block and must not fail.
    fn emit(&self, project_id: &str, category: EntityKind);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChangeSink;

impl ChangeSink for NoopChangeSink {
    fn emit(&self, _project_id: &str, _category: EntityKind) {}
}

/// Tokio broadcast-backed sink; call [`subscribe`](Self::subscribe) per view.
#[derive(Debug, Clone)]
pub struct BroadcastChangeSink {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for BroadcastChangeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastChangeSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl ChangeSink for BroadcastChangeSink {
    fn emit(&self, project_id: &str, category: EntityKind) {
        let event = ChangeEvent {
            project_id: project_id.to_string(),
            category,
        };
        // Err only means nobody is listening.
        if self.tx.send(event).is_err() {
            trace!("No subscribers for {} change on {}", category, project_id);
        }
    }
}
