//! The bus topics the processor and its workers agree on.
//!
//! Short codes, matching the original system's wire vocabulary; the exact
//! strings are not load-bearing to the algorithm, only their agreement
//! between producers and consumers.

/// Would carry a request to start a workflow, if submission were itself
/// bus-driven. The reference implementation this is grounded on defines the
/// topic but drives `start_workflow` via a direct call from the service
/// instead of a subscriber — this crate does the same; the constant is kept
/// for wire-format parity.
pub const WFS: &str = "wfs";

/// An operation (forward or compensating) is ready to run.
pub const WFOS: &str = "wfos";

/// An operation completed successfully.
pub const WFOC: &str = "wfoc";

/// An operation failed.
pub const WFOF: &str = "wfof";

/// A workflow reached its terminal forward state.
pub const WFC: &str = "wfc";

/// A workflow finished rolling back.
pub const WFR: &str = "wfr";
