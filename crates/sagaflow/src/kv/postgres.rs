//! PostgreSQL-backed [`Kv`] implementation — the durable production path.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, error, instrument};

use super::Kv;
use crate::error::KvError;

/// A `sagaflow_kv(key, value)` table fronted by a connection pool.
///
/// `put` is an upsert (`ON CONFLICT (key) DO UPDATE`); there is no version
/// column, matching the spec's plain read-modify-write contract — callers
/// needing compare-and-swap semantics are expected to serialise writes per
/// workflow id themselves (see the processor's per-id lock).
#[derive(Clone)]
pub struct PostgresKv {
    pool: PgPool,
}

impl PostgresKv {
    /// Connect and ensure the backing table exists.
    pub async fn connect(database_url: &str) -> Result<Self, KvError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| KvError::Backend(e.to_string()))?;

        let kv = Self { pool };
        kv.ensure_schema().await?;
        Ok(kv)
    }

    /// Wrap an already-constructed pool (useful when the pool is shared with
    /// other parts of a host application).
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), KvError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sagaflow_kv (
                key   TEXT PRIMARY KEY,
                value BYTEA NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| KvError::Backend(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl Kv for PostgresKv {
    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        sqlx::query(
            r#"
            INSERT INTO sagaflow_kv (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(&value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(%key, "sagaflow_kv put failed: {}", e);
            KvError::Backend(e.to_string())
        })?;

        debug!(%key, "kv put");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Vec<u8>, KvError> {
        let row = sqlx::query("SELECT value FROM sagaflow_kv WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| KvError::Backend(e.to_string()))?;

        match row {
            Some(row) => Ok(row.get::<Vec<u8>, _>("value")),
            None => Err(KvError::NotFound(key.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), KvError> {
        sqlx::query("DELETE FROM sagaflow_kv WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| KvError::Backend(e.to_string()))?;

        Ok(())
    }
}
