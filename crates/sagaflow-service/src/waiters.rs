//! Process-wide registry of completion waiters, keyed by workflow id.
//!
//! The submission path registers a waiter before starting the workflow, then
//! blocks on its receiving half; a bus subscriber on the completed/
//! rollbacked topics delivers the terminal payload and removes the entry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use sagaflow::prelude::WorkflowPayload;
use tokio::sync::oneshot;

#[derive(Clone)]
pub struct Waiters {
    inner: Arc<Mutex<HashMap<u64, oneshot::Sender<WorkflowPayload>>>>,
}

impl Waiters {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a one-shot waiter for `id`, returning its receiving half.
    pub fn register(&self, id: u64) -> oneshot::Receiver<WorkflowPayload> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().insert(id, tx);
        rx
    }

    /// Deliver the terminal payload to `id`'s waiter, if one is still
    /// registered. A waiter whose receiver was dropped (caller gave up) is
    /// simply discarded — the workflow keeps running to completion
    /// regardless.
    pub fn deliver(&self, payload: WorkflowPayload) {
        if let Some(tx) = self.inner.lock().remove(&payload.id) {
            let _ = tx.send(payload);
        }
    }
}

impl Default for Waiters {
    fn default() -> Self {
        Self::new()
    }
}
