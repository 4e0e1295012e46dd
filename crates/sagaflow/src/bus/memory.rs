//! In-process [`Bus`] built on spawned tasks — no external broker required.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::warn;

use super::{Bus, BusHandler};
use crate::error::BusError;

/// Fans a published message out to every subscriber of its topic.
///
/// Each handler invocation is spawned on the async runtime independently, so
/// a slow or failing subscriber cannot block publication to the others or to
/// future messages. Intended for tests and single-node demos; a networked
/// deployment swaps in a broker-backed [`Bus`] behind the same trait.
#[derive(Default)]
pub struct InMemoryBus {
    subscribers: RwLock<HashMap<String, Vec<BusHandler>>>,
    /// Every message ever published, keyed by topic — for test assertions.
    recorded: RwLock<HashMap<String, Vec<Vec<u8>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Has a message matching `bytes` ever been published to `topic`?
    pub fn has(&self, topic: &str, bytes: &[u8]) -> bool {
        self.recorded
            .read()
            .get(topic)
            .is_some_and(|msgs| msgs.iter().any(|m| m == bytes))
    }

    /// All messages published to `topic`, in publication order.
    pub fn recorded(&self, topic: &str) -> Vec<Vec<u8>> {
        self.recorded.read().get(topic).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Bus for InMemoryBus {
    async fn publish(&self, topic: &str, bytes: Vec<u8>) -> Result<(), BusError> {
        self.recorded
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(bytes.clone());

        let handlers = self
            .subscribers
            .read()
            .get(topic)
            .cloned()
            .unwrap_or_default();

        for handler in handlers {
            let bytes = bytes.clone();
            let topic = topic.to_string();
            tokio::spawn(async move {
                if let Err(e) = handler(bytes).await {
                    warn!(%topic, error = %e, "bus subscriber failed");
                }
            });
        }

        Ok(())
    }

    fn subscribe(&self, topic: &str, handler: BusHandler) {
        self.subscribers
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(handler);
    }
}
