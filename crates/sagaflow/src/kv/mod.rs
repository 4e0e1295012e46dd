//! Durable key-value store contract.
//!
//! `put`/`get`/`delete` over opaque bytes — the engine never interprets a
//! value's contents below the `workflow::state`/`workflow::definition` layer.
//! Implementations must be safe for concurrent use; the engine wraps them in
//! an `Arc` and shares one instance across every in-flight event.

mod memory;
mod postgres;

pub use memory::InMemoryKv;
pub use postgres::PostgresKv;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::KvError;

#[async_trait]
pub trait Kv: Send + Sync + 'static {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KvError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, KvError>;
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}

/// Convenience helpers for storing JSON-serialisable values.
///
/// Blanket-implemented for every [`Kv`]; this is the interface the workflow
/// engine actually calls, `put`/`get` in terms of raw bytes being the
/// storage-layer contract.
#[async_trait]
pub trait KvJsonExt: Kv {
    async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), KvError> {
        let bytes = serde_json::to_vec(value)?;
        self.put(key, bytes).await
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T, KvError> {
        let bytes = self.get(key).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like [`KvJsonExt::get_json`] but returns `Ok(None)` on a missing key
    /// instead of propagating [`KvError::NotFound`].
    async fn get_json_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, KvError> {
        match self.get_json(key).await {
            Ok(v) => Ok(Some(v)),
            Err(KvError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<T: Kv + ?Sized> KvJsonExt for T {}
