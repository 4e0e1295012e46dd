//! Monotonic workflow-id counter over the durable KV.

use serde::{Deserialize, Serialize};

use crate::error::KvError;
use crate::kv::{Kv, KvJsonExt};
use crate::workflow::INDEX_KEY;

#[derive(Debug, Serialize, Deserialize)]
struct IndexRecord {
    id: u64,
}

/// Allocate the next workflow id from `workflow:index`.
///
/// Read-modify-write with no compare-and-swap: this is safe only under
/// single-writer operation, as documented by the KV contract rather than
/// enforced by it. The Postgres backend can strengthen this to an atomic
/// `UPDATE ... RETURNING` without changing this function's signature.
pub async fn reserve_id<K: Kv + ?Sized>(kv: &K) -> Result<u64, KvError> {
    let current = kv
        .get_json_opt::<IndexRecord>(INDEX_KEY)
        .await?
        .map(|r| r.id)
        .unwrap_or(0);
    let next = current + 1;
    kv.put_json(INDEX_KEY, &IndexRecord { id: next }).await?;
    Ok(next)
}
