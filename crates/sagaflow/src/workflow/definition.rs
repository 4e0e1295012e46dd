//! Workflow definition: the immutable DAG a client submits.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::operation::Operation;
use crate::error::DefinitionError;

/// An immutable description of a saga: a DAG of compensatable operations
/// between named vertices, plus the payload handed to the `start` vertex.
///
/// Once submitted, a definition never changes; the [`crate::workflow::StateRecord`]
/// is what accumulates progress against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub start: String,
    pub end: String,
    pub operations: Vec<Operation>,
    pub payload: serde_json::Value,
}

impl WorkflowDefinition {
    pub fn new(
        name: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        operations: Vec<Operation>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            start: start.into(),
            end: end.into(),
            operations,
            payload,
        }
    }

    /// Validate that this definition forms a DAG in which every operation's
    /// `from` is reachable from `start` and every operation's `to` eventually
    /// reaches `end`, and that operation names are unique.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.operations.is_empty() {
            return Err(DefinitionError::Empty);
        }

        let mut seen_names = HashSet::new();
        for op in &self.operations {
            if !seen_names.insert(op.name.as_str()) {
                return Err(DefinitionError::DuplicateOperationName(op.name.clone()));
            }
        }

        let forward = self.adjacency(|op| (&op.from, &op.to));
        let backward = self.adjacency(|op| (&op.to, &op.from));

        let reachable_from_start = Self::reachable(&self.start, &forward);
        let can_reach_end = Self::reachable(&self.end, &backward);

        for op in &self.operations {
            if !reachable_from_start.contains(op.from.as_str()) {
                return Err(DefinitionError::UnreachableFromStart(op.from.clone()));
            }
            if !can_reach_end.contains(op.to.as_str()) {
                return Err(DefinitionError::CannotReachEnd(op.to.clone()));
            }
        }

        Ok(())
    }

    fn adjacency<'a, F>(&'a self, key: F) -> HashMap<&'a str, Vec<&'a str>>
    where
        F: Fn(&'a Operation) -> (&'a str, &'a str),
    {
        let mut index: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        for op in &self.operations {
            let (from, to) = key(op);
            index.entry(from).or_default().push(to);
        }
        index
    }

    fn reachable<'a>(from: &'a str, adjacency: &HashMap<&'a str, Vec<&'a str>>) -> HashSet<&'a str> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            if let Some(next) = adjacency.get(current) {
                for &n in next {
                    if visited.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }

        visited
    }
}
