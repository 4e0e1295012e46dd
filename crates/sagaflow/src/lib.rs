//! # Sagaflow
//!
//! A saga-style workflow orchestrator: a client submits a DAG of
//! compensatable operations between named vertices, and the engine drives it
//! to completion or, on any operation failure, rewinds it by invoking a
//! compensating action for every operation that already produced an effect.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                               │
//! │  (per-id lock, wires Processor to the Bus's wfoc/wfof topics)│
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Processor                             │
//! │  (loads/mutates/persists StateRecord, invokes the Tracer,    │
//! │   publishes operation-start and terminal workflow messages)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Tracer                               │
//! │  (Direct/Reverse DAG resolution from a StateRecord snapshot) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use sagaflow::prelude::*;
//!
//! let kv = Arc::new(InMemoryKv::new());
//! let bus = Arc::new(InMemoryBus::new());
//! let engine = Arc::new(Engine::new(kv.clone(), bus.clone()));
//! sagaflow::engine::subscribe(engine.clone());
//!
//! let id = reserve_id(&*kv).await?;
//! engine.start_workflow(id, definition, serde_json::json!({"order_id": 42})).await?;
//! ```

pub mod bus;
pub mod engine;
pub mod error;
pub mod id_allocator;
pub mod kv;
pub mod processor;
pub mod topics;
pub mod tracer;
pub mod workflow;

/// Common imports for building against this crate.
pub mod prelude {
    pub use crate::bus::{Bus, InMemoryBus};
    pub use crate::engine::Engine;
    pub use crate::error::{BusError, DefinitionError, KvError, ProcessorError};
    pub use crate::id_allocator::reserve_id;
    pub use crate::kv::{InMemoryKv, Kv, KvJsonExt, PostgresKv};
    pub use crate::processor::Processor;
    pub use crate::tracer::{resolve, Direct, Reverse, TraceAction, TracerStrategy};
    pub use crate::workflow::{
        definition_key, state_key, Operation, OperationPayload, StateRecord, WorkflowDefinition,
        WorkflowPayload, INDEX_KEY,
    };
}
