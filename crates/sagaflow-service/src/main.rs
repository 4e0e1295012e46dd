//! Sagaflow workflow submission service.
//!
//! Exposes `POST /workflows` (submit a definition, block for its terminal
//! result) and `GET /healthz`, backed by an in-memory or Postgres KV per
//! `SAGAFLOW_KV_BACKEND`.

mod config;
mod http;
mod waiters;

use std::sync::Arc;

use anyhow::Context;
use sagaflow::bus::BusHandler;
use sagaflow::error::BusError;
use sagaflow::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::{Config, KvBackend};
use waiters::Waiters;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(bind_addr = %config.bind_addr, kv_backend = ?config.kv_backend, "sagaflow-service starting");

    match config.kv_backend {
        KvBackend::Memory => run(config, Arc::new(InMemoryKv::new())).await,
        KvBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .expect("Config::from_env validated database_url is present for postgres");
            let kv = PostgresKv::connect(&url)
                .await
                .context("failed to connect to Postgres")?;
            run(config, Arc::new(kv)).await
        }
    }
}

async fn run<K: Kv>(config: Config, kv: Arc<K>) -> anyhow::Result<()> {
    let bus = Arc::new(InMemoryBus::new());
    let engine = Arc::new(Engine::new(kv, bus.clone()));
    sagaflow::engine::subscribe(engine.clone());

    if config.embedded_worker {
        sagaflow_worker::subscribe(bus.clone());
    }

    let waiters = Waiters::new();
    bus.subscribe(sagaflow::topics::WFC, completion_handler(waiters.clone()));
    bus.subscribe(sagaflow::topics::WFR, completion_handler(waiters.clone()));

    let state = http::AppState { engine, waiters };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("failed to bind SAGAFLOW_BIND_ADDR")?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Deliver a workflow's terminal message to its registered waiter.
fn completion_handler(waiters: Waiters) -> BusHandler {
    Arc::new(move |bytes| {
        let waiters = waiters.clone();
        Box::pin(async move {
            let payload: WorkflowPayload = serde_json::from_slice(&bytes).map_err(|e| BusError::Publish {
                topic: "wfc|wfr".to_string(),
                reason: e.to_string(),
            })?;
            waiters.deliver(payload);
            Ok(())
        })
    })
}
