//! Shared adjacency-index helper used by both tracer strategies.

use std::collections::HashMap;

use crate::workflow::Operation;

/// Groups a workflow's operations by one of their endpoints, preserving
/// declaration order within each group. Owned (rather than borrowing from
/// the definition) so the strategy structs can be built and handed around
/// without threading an extra lifetime through the tracer module.
pub(crate) fn index_by<F>(operations: &[Operation], key: F) -> HashMap<String, Vec<Operation>>
where
    F: Fn(&Operation) -> &str,
{
    let mut index: HashMap<String, Vec<Operation>> = HashMap::new();
    for op in operations {
        index.entry(key(op).to_string()).or_default().push(op.clone());
    }
    index
}
