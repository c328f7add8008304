//! Indexing outbox.
//!
//! The differ enqueues touched entities and returns immediately; an
//! [`IndexWorker`] drains the queue in the background. Search may lag writes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::embedding::VectorIndex;
use crate::models::CanonEntity;

/// Sending half of the outbox. Cheap to clone; enqueueing never blocks.
#[derive(Clone)]
pub struct IndexQueue {
    tx: mpsc::UnboundedSender<CanonEntity>,
}

pub struct IndexWorker {
    rx: mpsc::UnboundedReceiver<CanonEntity>,
    index: Arc<VectorIndex>,
}

impl IndexQueue {
    pub fn new(index: Arc<VectorIndex>) -> (IndexQueue, IndexWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (IndexQueue { tx }, IndexWorker { rx, index })
    }

    /// Queue an entity for (re-)embedding. Dropped with a warning if the
    /// worker has stopped.
    pub fn upsert(&self, entity: CanonEntity) {
        if let Err(e) = self.tx.send(entity) {
            warn!("Index worker stopped; dropping {}", e.0.entity_id());
        }
    }
}

impl IndexWorker {
    /// Process jobs until every [`IndexQueue`] handle is dropped.
    pub async fn run(mut self) {
        info!("Index worker started");
        while let Some(entity) = self.rx.recv().await {
            self.index.index(&entity).await;
        }
        info!("Index worker stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process whatever is queued right now without waiting for more.
    pub async fn drain_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(entity) = self.rx.try_recv() {
            self.index.index(&entity).await;
            processed += 1;
        }
        processed
    }
}
