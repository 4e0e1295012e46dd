//! Bus message envelopes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::operation::Operation;

/// An operation-start/completed/failed event, as carried on the bus.
///
/// Immutable once constructed. The same shape is reused for the start,
/// completed, and failed topics; `payload` is the operation's input when
/// published by the processor and the operation's result/error when
/// published back by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationPayload {
    pub id: u64,
    #[serde(rename = "isRollback")]
    pub is_rollback: bool,
    pub name: String,
    pub operation: Operation,
    pub payload: serde_json::Value,
}

/// The terminal envelope published exactly once per workflow, on the
/// workflow-completed or workflow-rollbacked topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPayload {
    pub id: u64,
    #[serde(rename = "isRollback")]
    pub is_rollback: bool,
    pub name: String,
    pub data: HashMap<String, HashMap<String, serde_json::Value>>,
}
