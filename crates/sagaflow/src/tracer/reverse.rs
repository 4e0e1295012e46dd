//! The rollback (reverse) traversal strategy.

use std::collections::HashMap;

use super::route::index_by;
use super::TracerStrategy;
use crate::workflow::{Operation, StateRecord, WorkflowDefinition};

/// Drives compensation from `end` back towards `start`, following
/// `to -> from`.
///
/// A vertex is ready once every operation leaving it (forward) is settled:
/// not in forward `inProgress`, not in reverse `inProgress`, and either
/// never completed forward or already compensated. An operation counts as
/// processed if it never produced a forward effect, or if its compensation
/// has already finished; it is spawnable as long as it is not already in
/// reverse `inProgress`.
pub struct Reverse<'a> {
    start: &'a str,
    from_index: HashMap<String, Vec<Operation>>,
    to_index: HashMap<String, Vec<Operation>>,
    state: &'a StateRecord,
}

impl<'a> Reverse<'a> {
    pub fn new(definition: &'a WorkflowDefinition, state: &'a StateRecord) -> Self {
        Self {
            start: &definition.start,
            from_index: index_by(&definition.operations, |op| &op.from),
            to_index: index_by(&definition.operations, |op| &op.to),
            state,
        }
    }

    fn settled(&self, op: &Operation) -> bool {
        let done_forward = self.state.is_done(op, false);
        !self.state.is_in_progress(op, false)
            && !self.state.is_in_progress(op, true)
            && (!done_forward || self.state.is_done(op, true))
    }
}

impl TracerStrategy for Reverse<'_> {
    fn is_ready(&self, vertex: &str) -> bool {
        match self.from_index.get(vertex) {
            Some(outgoing) => outgoing.iter().all(|op| self.settled(op)),
            None => true,
        }
    }

    fn is_finished(&self, vertex: &str) -> bool {
        vertex == self.start
    }

    fn get_next(&self, vertex: &str) -> &[Operation] {
        self.to_index.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_processed(&self, op: &Operation) -> bool {
        let done_forward = self.state.is_done(op, false);
        !done_forward || self.state.is_done(op, true)
    }

    fn can_be_spawned(&self, op: &Operation) -> bool {
        !self.state.is_in_progress(op, true)
    }

    fn next_vertex<'v>(&self, op: &'v Operation) -> &'v str {
        &op.from
    }

    fn is_rollback(&self) -> bool {
        true
    }
}
