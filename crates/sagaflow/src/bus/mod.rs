//! Topic-based pub/sub contract.
//!
//! At-least-once delivery is assumed; ordering is not required — the engine
//! never relies on message arrival order (see the tracer's readiness
//! predicates). Producers and consumers must agree on an encoding; this
//! crate uses JSON throughout.

mod memory;

pub use memory::InMemoryBus;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BusError;

/// A subscriber callback: takes the raw message bytes, returns whether it
/// was handled successfully. Boxed so the bus can hold a heterogeneous set
/// of subscribers per topic.
pub type BusHandler =
    Arc<dyn Fn(Vec<u8>) -> Pin<Box<dyn Future<Output = Result<(), BusError>> + Send>> + Send + Sync>;

#[async_trait]
pub trait Bus: Send + Sync + 'static {
    async fn publish(&self, topic: &str, bytes: Vec<u8>) -> Result<(), BusError>;

    /// Register `handler` to be invoked for every message published to
    /// `topic` from now on. Each invocation runs as its own task: a handler
    /// that fails for one message does not block delivery to others.
    fn subscribe(&self, topic: &str, handler: BusHandler);
}
