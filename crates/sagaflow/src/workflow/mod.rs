//! The workflow data model: operations, definitions, the durable state
//! record, and the bus message envelopes built from them.

mod definition;
mod keys;
mod operation;
mod payload;
mod state;

pub use definition::WorkflowDefinition;
pub use keys::{definition_key, state_key, INDEX_KEY};
pub use operation::Operation;
pub use payload::{OperationPayload, WorkflowPayload};
pub use state::StateRecord;
