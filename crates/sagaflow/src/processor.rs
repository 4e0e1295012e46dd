//! Event-driven coordinator: the processor that drives a single workflow
//! instance's state machine in response to one event at a time.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::bus::Bus;
use crate::error::ProcessorError;
use crate::kv::{Kv, KvJsonExt};
use crate::tracer::{resolve, Direct, Reverse, TraceAction};
use crate::topics;
use crate::workflow::{state_key, Operation, OperationPayload, StateRecord, WorkflowDefinition, WorkflowPayload};

/// Drives one workflow instance's state machine in response to a single
/// event: a start request, an operation completion, or an operation
/// failure.
///
/// Holds shared references to the KV and Bus so a fresh `Processor` is cheap
/// to build per event (matching the reference implementation's per-call
/// processor). Per-id serialisation across events is the caller's
/// responsibility — see [`crate::engine::Engine`], which holds a processor
/// behind a per-id lock.
pub struct Processor<K: Kv, B: Bus> {
    kv: Arc<K>,
    bus: Arc<B>,
    definition: WorkflowDefinition,
}

impl<K: Kv, B: Bus> Processor<K, B> {
    pub fn new(kv: Arc<K>, bus: Arc<B>, definition: WorkflowDefinition) -> Self {
        Self { kv, bus, definition }
    }

    /// Build a fresh state record for `id`, persist it, and resolve the
    /// direct tracer from `start`.
    #[instrument(skip(self, initial_payload), fields(workflow_id = id))]
    pub async fn start_workflow(&self, id: u64, initial_payload: Value) -> Result<(), ProcessorError> {
        let state = StateRecord::init(id, &self.definition.start, initial_payload);
        self.persist(&state).await?;
        info!(workflow_id = id, "workflow started");

        self.drive(state).await
    }

    /// Apply a successful operation completion and resolve whichever
    /// direction's tracer matches the state's current `isRollback` flag.
    #[instrument(skip(self, event), fields(workflow_id = event.id, op = %event.operation.name, is_rollback = event.is_rollback))]
    pub async fn on_complete(&self, event: OperationPayload) -> Result<(), ProcessorError> {
        let mut state = self.load(event.id).await?;

        state.mark_done(&event.operation, event.is_rollback);
        state.set_data(&event.operation.to, &event.operation.name, event.payload);
        self.persist(&state).await?;

        info!(
            workflow_id = event.id,
            op = %event.operation.name,
            is_rollback = event.is_rollback,
            "operation completed"
        );

        self.drive(state).await
    }

    /// Apply an operation failure: clear its forward in-progress marker and
    /// flip the state into rollback, then resolve the reverse tracer.
    ///
    /// A failure's payload is never stored in `data` — the operation did not
    /// produce an effect. If the state is already rolling back, `isRollback`
    /// is left as-is (it is already true); the operation is still cleared
    /// from forward `inProgress` and reverse resolution still runs.
    #[instrument(skip(self, event), fields(workflow_id = event.id, op = %event.operation.name))]
    pub async fn on_failure(&self, event: OperationPayload) -> Result<(), ProcessorError> {
        let mut state = self.load(event.id).await?;

        state.unmark_in_progress(&event.operation, false);
        state.is_rollback = true;
        self.persist(&state).await?;

        warn!(workflow_id = event.id, op = %event.operation.name, "operation failed, rolling back");

        self.drive(state).await
    }

    /// Resolve the tracer matching `state.is_rollback` against the snapshot
    /// as of entry, then carry out every resulting action in order,
    /// mutating and persisting `state` as we go.
    ///
    /// Readiness and eligibility were decided against the entry snapshot
    /// (per the tracer's contract), so later mutations in this loop do not
    /// retroactively change which operations were selected to spawn — they
    /// only accumulate into the persisted record, exactly as repeated
    /// load-mutate-persist calls against the KV would, since nothing else
    /// can write to this id while we hold it (see the per-id serialisation
    /// note on [`crate::engine::Engine`]).
    async fn drive(&self, mut state: StateRecord) -> Result<(), ProcessorError> {
        let actions = if state.is_rollback {
            let tracer = Reverse::new(&self.definition, &state);
            resolve(&tracer, &self.definition.end)
        } else {
            let tracer = Direct::new(&self.definition, &state);
            resolve(&tracer, &self.definition.start)
        };

        for action in actions {
            match action {
                TraceAction::Spawn(op) => self.spawn_operation(&mut state, op).await?,
                TraceAction::End => self.end_workflow(&mut state).await?,
            }
        }

        Ok(())
    }

    /// Mark `op` in-progress at the state's current direction, persist, and
    /// publish its start event carrying the full data bucket accumulated at
    /// `op.from`.
    async fn spawn_operation(&self, state: &mut StateRecord, op: Operation) -> Result<(), ProcessorError> {
        let is_rollback = state.is_rollback;
        let bucket = state.data.get(&op.from).cloned().unwrap_or_default();
        let payload = serde_json::to_value(bucket)?;

        state.mark_in_progress(&op, is_rollback);
        self.persist(state).await?;

        let event = OperationPayload {
            id: state.id,
            is_rollback,
            name: self.definition.name.clone(),
            operation: op.clone(),
            payload,
        };
        let bytes = serde_json::to_vec(&event)?;
        self.bus.publish(topics::WFOS, bytes).await?;

        info!(workflow_id = state.id, op = %op.name, is_rollback, "operation spawned");
        Ok(())
    }

    /// Mark the workflow terminal and publish its terminal envelope, unless
    /// it is already terminal (idempotent termination).
    async fn end_workflow(&self, state: &mut StateRecord) -> Result<(), ProcessorError> {
        if state.completed {
            return Ok(());
        }

        state.completed = true;
        self.persist(state).await?;

        let event = WorkflowPayload {
            id: state.id,
            is_rollback: state.is_rollback,
            name: self.definition.name.clone(),
            data: state.data.clone(),
        };
        let bytes = serde_json::to_vec(&event)?;
        let topic = if state.is_rollback { topics::WFR } else { topics::WFC };
        self.bus.publish(topic, bytes).await?;

        info!(workflow_id = state.id, is_rollback = state.is_rollback, "workflow terminated");
        Ok(())
    }

    async fn load(&self, id: u64) -> Result<StateRecord, ProcessorError> {
        Ok(self.kv.get_json(&state_key(id)).await?)
    }

    async fn persist(&self, state: &StateRecord) -> Result<(), ProcessorError> {
        Ok(self.kv.put_json(&state_key(state.id), state).await?)
    }
}
