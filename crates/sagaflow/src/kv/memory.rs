//! In-process [`Kv`] implementation for tests and single-node demos.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::Kv;
use crate::error::KvError;

/// A `HashMap`-backed store guarded by a `parking_lot::RwLock`.
///
/// Not durable across process restarts; intended for unit/integration tests
/// and for running the whole system on a single node without standing up
/// Postgres.
#[derive(Default)]
pub struct InMemoryKv {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every key currently stored (for assertions in tests).
    pub fn snapshot(&self) -> HashMap<String, Vec<u8>> {
        self.values.read().clone()
    }
}

#[async_trait]
impl Kv for InMemoryKv {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, KvError> {
        self.values
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| KvError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.values.write().remove(key);
        Ok(())
    }
}
