//! The durable state record for a single workflow instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::operation::Operation;

/// In-memory image of a workflow instance's progress.
///
/// The durable KV copy under `workflow:state:<id>` is the ground truth; this
/// struct is only ever a snapshot of it. There is no cross-record locking —
/// correctness relies on events for a single workflow `id` being processed
/// one at a time (see the processor's per-id serialisation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateRecord {
    pub id: u64,
    #[serde(rename = "isRollback")]
    pub is_rollback: bool,
    pub completed: bool,
    pub done: HashMap<String, Operation>,
    #[serde(rename = "inProgress")]
    pub in_progress: HashMap<String, Operation>,
    pub data: HashMap<String, HashMap<String, serde_json::Value>>,
}

impl StateRecord {
    /// Build a fresh record for `id`, with `data[start]["input"] = initial_payload`.
    ///
    /// Callers must not call this twice for a live instance id; the only
    /// guarantee is that re-running it is permitted to happen, not that it
    /// is safe to race with in-flight events for the same id.
    pub fn init(id: u64, start: &str, initial_payload: serde_json::Value) -> Self {
        let mut record = Self {
            id,
            is_rollback: false,
            completed: false,
            done: HashMap::new(),
            in_progress: HashMap::new(),
            data: HashMap::new(),
        };
        record.set_data(start, "input", initial_payload);
        record
    }

    /// Upsert a payload into the nested `data` mapping.
    pub fn set_data(&mut self, vertex: &str, op_name: &str, payload: serde_json::Value) {
        self.data
            .entry(vertex.to_string())
            .or_default()
            .insert(op_name.to_string(), payload);
    }

    pub fn is_done(&self, op: &Operation, is_rollback: bool) -> bool {
        self.done.contains_key(&op.op_key(is_rollback))
    }

    pub fn is_in_progress(&self, op: &Operation, is_rollback: bool) -> bool {
        self.in_progress.contains_key(&op.op_key(is_rollback))
    }

    /// Move `op` from `inProgress` to `done` at the given direction.
    ///
    /// Per the invariant in §4.1, these two mutations always happen together.
    pub fn mark_done(&mut self, op: &Operation, is_rollback: bool) {
        let key = op.op_key(is_rollback);
        self.in_progress.remove(&key);
        self.done.insert(key, op.clone());
    }

    pub fn mark_in_progress(&mut self, op: &Operation, is_rollback: bool) {
        self.in_progress.insert(op.op_key(is_rollback), op.clone());
    }

    pub fn unmark_in_progress(&mut self, op: &Operation, is_rollback: bool) {
        self.in_progress.remove(&op.op_key(is_rollback));
    }
}
