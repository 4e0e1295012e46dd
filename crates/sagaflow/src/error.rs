//! Leaf error types for the engine.
//!
//! Each component gets its own `thiserror` enum; `ProcessorError` composes
//! the lower layers since the processor is the only thing that touches both
//! the KV and the bus in the same operation.

use thiserror::Error;

/// Errors from a [`crate::kv::Kv`] implementation.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("kv backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from a [`crate::bus::Bus`] implementation.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },
}

/// Errors raised while validating a [`crate::workflow::WorkflowDefinition`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("operation name {0:?} is used more than once")]
    DuplicateOperationName(String),

    #[error("vertex {0:?} is not reachable from the start vertex")]
    UnreachableFromStart(String),

    #[error("vertex {0:?} cannot reach the end vertex")]
    CannotReachEnd(String),

    #[error("workflow has no operations")]
    Empty,
}

/// Errors from the [`crate::processor::Processor`].
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Kv(#[from] KvError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("workflow definition not found: {0}")]
    DefinitionNotFound(u64),
}
