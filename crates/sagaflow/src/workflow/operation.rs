//! A single directed edge in a workflow DAG.

use serde::{Deserialize, Serialize};

/// An operation between two vertices.
///
/// `name` must be unique within a workflow. Operations are immutable once a
/// workflow definition has been submitted; the only thing that varies at
/// runtime is whether a given occurrence is a forward execution or its
/// compensating rollback, which is tracked via the `isRollback` bit of the
/// op-key rather than on the operation itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Operation {
    pub name: String,
    pub from: String,
    pub to: String,
}

impl Operation {
    pub fn new(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// The compound key `"<name>:<from>:<to>:<isRollback>"` used to track
    /// this operation's occurrence in `done`/`inProgress`.
    pub fn op_key(&self, is_rollback: bool) -> String {
        format!("{}:{}:{}:{}", self.name, self.from, self.to, is_rollback)
    }
}
