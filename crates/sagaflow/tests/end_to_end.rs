//! End-to-end scenarios driven through the [`Engine`], exercising the
//! tracer and processor together the way a real deployment would: events
//! arrive one at a time and the engine decides what to spawn next.

use std::sync::Arc;

use sagaflow::prelude::*;
use sagaflow::topics;
use sagaflow::workflow::Operation as Op;
use serde_json::Value;

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
        Value::Null,
    )
}

fn extended() -> WorkflowDefinition {
    WorkflowDefinition::new(
        "extended",
        "s1",
        "s4",
        vec![
            Op::new("op1", "s1", "s2"),
            Op::new("op2", "s2", "s3"),
            Op::new("op3", "s1", "s3"),
            Op::new("op4", "s3", "s4"),
            Op::new("op5", "s1", "s4"),
        ],
        Value::Null,
    )
}

async fn harness(
    def: WorkflowDefinition,
) -> (Arc<Engine<InMemoryKv, InMemoryBus>>, Arc<InMemoryKv>, Arc<InMemoryBus>) {
    let kv = Arc::new(InMemoryKv::new());
    let bus = Arc::new(InMemoryBus::new());
    let engine = Arc::new(Engine::new(kv.clone(), bus.clone()));
    engine.start_workflow(1, def, Value::Null).await.unwrap();
    (engine, kv, bus)
}

async fn state(kv: &InMemoryKv, id: u64) -> StateRecord {
    kv.get_json(&state_key(id)).await.unwrap()
}

fn complete(op: Op, is_rollback: bool) -> OperationPayload {
    OperationPayload {
        id: 1,
        is_rollback,
        name: "diamond".into(),
        operation: op,
        payload: Value::Null,
    }
}

fn extended_event(op: Op, is_rollback: bool) -> OperationPayload {
    OperationPayload {
        id: 1,
        is_rollback,
        name: "extended".into(),
        operation: op,
        payload: Value::Null,
    }
}

#[tokio::test]
async fn e2_rollback_after_all_forward_operations_completed() {
    let (engine, kv, bus) = harness(diamond()).await;

    engine.on_complete(complete(Op::new("op1", "s1", "s2"), false)).await.unwrap();
    engine.on_complete(complete(Op::new("op2", "s1", "s3"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.is_in_progress(&Op::new("op3", "s3", "s2"), false));

    engine.on_failure(complete(Op::new("op3", "s3", "s2"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.is_rollback);
    assert!(s.is_in_progress(&Op::new("op1", "s1", "s2"), true));
    assert!(s.is_in_progress(&Op::new("op2", "s1", "s3"), true));

    engine.on_complete(complete(Op::new("op1", "s1", "s2"), true)).await.unwrap();
    engine.on_complete(complete(Op::new("op2", "s1", "s3"), true)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.completed);
    assert!(s.is_rollback);
    assert_eq!(bus.recorded(topics::WFR).len(), 1);
    assert!(bus.recorded(topics::WFC).is_empty());

    let terminal: WorkflowPayload = serde_json::from_slice(&bus.recorded(topics::WFR)[0]).unwrap();
    assert!(terminal.data["s2"].get("op1").is_some());
    assert!(terminal.data["s2"].get("op3").is_none());
    assert!(terminal.data["s3"].get("op2").is_some());
}

#[tokio::test]
async fn e3_early_forward_failure_compensates_only_the_completed_sibling() {
    let (engine, kv, bus) = harness(diamond()).await;

    engine.on_complete(complete(Op::new("op1", "s1", "s2"), false)).await.unwrap();
    engine.on_failure(complete(Op::new("op2", "s1", "s3"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.is_in_progress(&Op::new("op1", "s1", "s2"), true));
    assert!(!s.is_in_progress(&Op::new("op2", "s1", "s3"), true));

    engine.on_complete(complete(Op::new("op1", "s1", "s2"), true)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.completed);
    assert!(s.is_rollback);
    assert_eq!(bus.recorded(topics::WFR).len(), 1);
}

#[tokio::test]
async fn e4_failure_blocked_while_sibling_still_in_progress_forward() {
    let (engine, kv, bus) = harness(diamond()).await;

    engine.on_failure(complete(Op::new("op1", "s1", "s2"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.is_rollback);
    assert!(!s.is_in_progress(&Op::new("op1", "s1", "s2"), true));
    assert!(bus.recorded(topics::WFOS).len() == 2, "no reverse spawn yet, op2 still running forward");

    engine.on_complete(complete(Op::new("op2", "s1", "s3"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.is_in_progress(&Op::new("op2", "s1", "s3"), true));

    engine.on_complete(complete(Op::new("op2", "s1", "s3"), true)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.completed);
    assert!(s.is_rollback);
    assert_eq!(bus.recorded(topics::WFR).len(), 1);
}

#[tokio::test]
async fn e5_duplicate_completion_is_a_no_op_the_second_time() {
    let (engine, kv, bus) = harness(diamond()).await;

    let op1_done = complete(Op::new("op1", "s1", "s2"), false);
    engine.on_complete(op1_done.clone()).await.unwrap();
    engine.on_complete(op1_done).await.unwrap();
    engine.on_complete(complete(Op::new("op2", "s1", "s3"), false)).await.unwrap();
    engine.on_complete(complete(Op::new("op3", "s3", "s2"), false)).await.unwrap();

    let op3_spawns = bus
        .recorded(topics::WFOS)
        .into_iter()
        .filter(|m| {
            let p: OperationPayload = serde_json::from_slice(m).unwrap();
            p.operation.name == "op3"
        })
        .count();
    assert_eq!(op3_spawns, 1);

    let s = state(&kv, 1).await;
    assert!(s.completed);
    assert!(!s.is_rollback);
    assert_eq!(bus.recorded(topics::WFC).len(), 1);
}

#[tokio::test]
async fn e6_extended_diamond_blocks_op4_until_op3_done_and_only_spawns_what_is_eligible() {
    let (engine, kv, bus) = harness(extended()).await;

    let initial_spawns: Vec<String> = bus
        .recorded(topics::WFOS)
        .iter()
        .map(|m| serde_json::from_slice::<OperationPayload>(m).unwrap().operation.name)
        .collect();
    assert_eq!(initial_spawns.len(), 3);
    assert!(initial_spawns.contains(&"op1".to_string()));
    assert!(initial_spawns.contains(&"op3".to_string()));
    assert!(initial_spawns.contains(&"op5".to_string()));

    engine.on_complete(extended_event(Op::new("op1", "s1", "s2"), false)).await.unwrap();
    engine.on_complete(extended_event(Op::new("op3", "s1", "s3"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.is_in_progress(&Op::new("op2", "s2", "s3"), false));
    assert!(!s.is_in_progress(&Op::new("op4", "s3", "s4"), false), "op4 needs op2 AND op3 done at s3");

    engine.on_complete(extended_event(Op::new("op2", "s2", "s3"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.is_in_progress(&Op::new("op4", "s3", "s4"), false));
    assert!(!s.completed, "op5 still in progress, end not yet reached");

    engine.on_complete(extended_event(Op::new("op4", "s3", "s4"), false)).await.unwrap();
    assert!(!state(&kv, 1).await.completed, "op5 still outstanding at s4");

    engine.on_complete(extended_event(Op::new("op5", "s1", "s4"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert!(s.completed);
    assert!(!s.is_rollback);
    assert_eq!(bus.recorded(topics::WFC).len(), 1);
}

#[tokio::test]
async fn invariant_at_most_one_terminal_message_is_ever_published() {
    let (engine, _kv, bus) = harness(diamond()).await;

    engine.on_complete(complete(Op::new("op1", "s1", "s2"), false)).await.unwrap();
    engine.on_complete(complete(Op::new("op2", "s1", "s3"), false)).await.unwrap();
    engine.on_complete(complete(Op::new("op3", "s3", "s2"), false)).await.unwrap();
    // Late, spurious re-delivery after termination must not re-publish.
    engine.on_complete(complete(Op::new("op3", "s3", "s2"), false)).await.unwrap();

    assert_eq!(bus.recorded(topics::WFC).len() + bus.recorded(topics::WFR).len(), 1);
}

#[tokio::test]
async fn invariant_forward_input_bucket_is_stable_across_the_run() {
    let kv = Arc::new(InMemoryKv::new());
    let bus = Arc::new(InMemoryBus::new());
    let engine = Arc::new(Engine::new(kv.clone(), bus.clone()));
    let payload = serde_json::json!({"order_id": 42});
    engine.start_workflow(1, diamond(), payload.clone()).await.unwrap();

    engine.on_complete(complete(Op::new("op1", "s1", "s2"), false)).await.unwrap();
    engine.on_complete(complete(Op::new("op2", "s1", "s3"), false)).await.unwrap();
    engine.on_complete(complete(Op::new("op3", "s3", "s2"), false)).await.unwrap();

    let s = state(&kv, 1).await;
    assert_eq!(s.data["s1"]["input"], payload);
}
