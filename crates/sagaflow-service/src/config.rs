//! Environment-driven service configuration.
//!
//! Plain `std::env` parsing behind a `dotenvy`-loaded `.env`, matching this
//! codebase's service configuration style rather than a config-file format.

use std::net::SocketAddr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub kv_backend: KvBackend,
    pub database_url: Option<String>,
    pub embedded_worker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvBackend {
    Memory,
    Postgres,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("SAGAFLOW_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("invalid SAGAFLOW_BIND_ADDR")?;

        let kv_backend = match std::env::var("SAGAFLOW_KV_BACKEND") {
            Ok(v) if v == "postgres" => KvBackend::Postgres,
            Ok(v) if v == "memory" => KvBackend::Memory,
            Ok(other) => anyhow::bail!("unknown SAGAFLOW_KV_BACKEND: {other:?}"),
            Err(_) => KvBackend::Memory,
        };

        let database_url = std::env::var("SAGAFLOW_DATABASE_URL").ok();
        if kv_backend == KvBackend::Postgres && database_url.is_none() {
            anyhow::bail!("SAGAFLOW_DATABASE_URL is required when SAGAFLOW_KV_BACKEND=postgres");
        }

        // The stub worker is in-process by default, matching the original's
        // single go-micro service: one process holds both the submission
        // handler and the operation-start subscriber, since they share one
        // broker connection. Set to "false" to run workers as a separate
        // deployment against a non-in-memory Bus implementation instead.
        let embedded_worker = std::env::var("SAGAFLOW_EMBEDDED_WORKER")
            .map(|v| v != "false")
            .unwrap_or(true);

        Ok(Self {
            bind_addr,
            kv_backend,
            database_url,
            embedded_worker,
        })
    }
}
