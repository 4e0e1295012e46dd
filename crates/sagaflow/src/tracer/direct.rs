//! The forward (direct) traversal strategy.

use std::collections::HashMap;

use super::route::index_by;
use super::TracerStrategy;
use crate::workflow::{Operation, StateRecord, WorkflowDefinition};

/// Drives execution from `start` towards `end`, following `from -> to`.
///
/// A vertex is ready once every operation incoming to it has completed
/// forward; an operation is processed once it is in forward `done`, and
/// spawnable as long as it is not already in forward `inProgress`.
pub struct Direct<'a> {
    end: &'a str,
    from_index: HashMap<String, Vec<Operation>>,
    to_index: HashMap<String, Vec<Operation>>,
    state: &'a StateRecord,
}

impl<'a> Direct<'a> {
    pub fn new(definition: &'a WorkflowDefinition, state: &'a StateRecord) -> Self {
        Self {
            end: &definition.end,
            from_index: index_by(&definition.operations, |op| &op.from),
            to_index: index_by(&definition.operations, |op| &op.to),
            state,
        }
    }
}

impl TracerStrategy for Direct<'_> {
    fn is_ready(&self, vertex: &str) -> bool {
        match self.to_index.get(vertex) {
            Some(incoming) => incoming.iter().all(|op| self.state.is_done(op, false)),
            None => true,
        }
    }

    fn is_finished(&self, vertex: &str) -> bool {
        vertex == self.end
    }

    fn get_next(&self, vertex: &str) -> &[Operation] {
        self.from_index.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_processed(&self, op: &Operation) -> bool {
        self.state.is_done(op, false)
    }

    fn can_be_spawned(&self, op: &Operation) -> bool {
        !self.state.is_in_progress(op, false)
    }

    fn next_vertex<'v>(&self, op: &'v Operation) -> &'v str {
        &op.to
    }

    fn is_rollback(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::{resolve, TraceAction};
    use crate::workflow::Operation as Op;

    fn diamond() -> WorkflowDefinition {
        WorkflowDefinition::new(
            "diamond",
            "s1",
            "s2",
            vec![
                Op::new("op1", "s1", "s2"),
                Op::new("op2", "s1", "s3"),
                Op::new("op3", "s3", "s2"),
            ],
            serde_json::json!(null),
        )
    }

    #[test]
    fn initial_resolve_spawns_both_roots() {
        let def = diamond();
        let state = StateRecord::init(1, &def.start, def.payload.clone());
        let tracer = Direct::new(&def, &state);

        let actions = resolve(&tracer, &def.start);
        assert_eq!(
            actions,
            vec![
                TraceAction::Spawn(Op::new("op1", "s1", "s2")),
                TraceAction::Spawn(Op::new("op2", "s1", "s3")),
            ]
        );
    }

    #[test]
    fn op3_spawns_once_op2_done_but_s2_not_finished_until_op1_done_too() {
        let def = diamond();
        let mut state = StateRecord::init(1, &def.start, def.payload.clone());
        state.mark_done(&Op::new("op2", "s1", "s3"), false);

        let tracer = Direct::new(&def, &state);
        let actions = resolve(&tracer, &def.start);
        assert_eq!(actions, vec![TraceAction::Spawn(Op::new("op3", "s3", "s2"))]);
    }

    #[test]
    fn workflow_ends_once_all_operations_done() {
        let def = diamond();
        let mut state = StateRecord::init(1, &def.start, def.payload.clone());
        for op in &def.operations {
            state.mark_done(op, false);
        }

        let tracer = Direct::new(&def, &state);
        let actions = resolve(&tracer, &def.start);
        assert_eq!(actions, vec![TraceAction::End]);
    }

    #[test]
    fn does_not_respawn_an_operation_already_in_progress() {
        let def = diamond();
        let mut state = StateRecord::init(1, &def.start, def.payload.clone());
        state.mark_in_progress(&Op::new("op1", "s1", "s2"), false);
        state.mark_in_progress(&Op::new("op2", "s1", "s3"), false);

        let tracer = Direct::new(&def, &state);
        assert_eq!(resolve(&tracer, &def.start), Vec::new());
    }

    #[test]
    fn reaching_the_same_join_vertex_twice_spawns_its_outgoing_op_once() {
        // op4/op5 exercise the E6 diamond shape (s3 reachable via op2 and op3).
        let def = WorkflowDefinition::new(
            "e6",
            "s1",
            "s4",
            vec![
                Op::new("op1", "s1", "s2"),
                Op::new("op2", "s2", "s3"),
                Op::new("op3", "s1", "s3"),
                Op::new("op4", "s3", "s4"),
                Op::new("op5", "s1", "s4"),
            ],
            serde_json::json!(null),
        );
        let mut state = StateRecord::init(1, &def.start, def.payload.clone());
        state.mark_done(&Op::new("op1", "s1", "s2"), false);
        state.mark_done(&Op::new("op2", "s2", "s3"), false);
        state.mark_done(&Op::new("op3", "s1", "s3"), false);
        state.mark_in_progress(&Op::new("op5", "s1", "s4"), false);

        let tracer = Direct::new(&def, &state);
        let actions = resolve(&tracer, &def.start);
        assert_eq!(actions, vec![TraceAction::Spawn(Op::new("op4", "s3", "s4"))]);
    }
}
