//! HTTP surface: the submission endpoint and a liveness probe.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use sagaflow::prelude::*;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, instrument, Instrument};

use crate::waiters::Waiters;

pub struct AppState<K: Kv, B: Bus> {
    pub engine: Arc<Engine<K, B>>,
    pub waiters: Waiters,
}

impl<K: Kv, B: Bus> Clone for AppState<K, B> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            waiters: self.waiters.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OperationSpec {
    name: String,
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct SubmitWorkflowRequest {
    name: String,
    start: String,
    end: String,
    operations: Vec<OperationSpec>,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct SubmitWorkflowResponse {
    id: u64,
    name: String,
    #[serde(rename = "isRollback")]
    is_rollback: bool,
    data: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router<K: Kv, B: Bus>(state: AppState<K, B>) -> Router {
    Router::new()
        .route("/workflows", post(submit_workflow::<K, B>))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Tag every request with a time-ordered id, both as a tracing span field
/// and as an `x-request-id` response header — cheap enough to always run,
/// and the only correlation handle a caller has when a submission fails
/// after the workflow has already started.
async fn request_id(req: Request, next: Next) -> Response {
    let id = uuid::Uuid::now_v7();
    let span = tracing::info_span!("request", request_id = %id);
    async move {
        let mut response = next.run(req).await;
        if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
    .instrument(span)
    .await
}

/// Allocate an id, persist the definition, start the workflow, and block
/// until its terminal message arrives — the `RunWorkflow`-equivalent RPC
/// handler, response-shaped to match the original: each per-operation
/// payload inside `data` is individually JSON-serialised to a string.
#[instrument(skip(state, request), fields(workflow_name = %request.name))]
async fn submit_workflow<K: Kv, B: Bus>(
    State(state): State<AppState<K, B>>,
    Json(request): Json<SubmitWorkflowRequest>,
) -> Result<Json<SubmitWorkflowResponse>, (StatusCode, Json<ErrorResponse>)> {
    let operations = request
        .operations
        .into_iter()
        .map(|op| Operation::new(op.name, op.from, op.to))
        .collect();

    let definition = WorkflowDefinition::new(
        request.name,
        request.start,
        request.end,
        operations,
        request.payload.clone(),
    );
    definition.validate().map_err(|e| bad_request(e.to_string()))?;

    let id = reserve_id(state.engine.kv().as_ref())
        .await
        .map_err(|e| internal_error(e.to_string()))?;
    let rx = state.waiters.register(id);

    state
        .engine
        .start_workflow(id, definition, request.payload)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    let terminal = rx
        .await
        .map_err(|_| internal_error("workflow waiter dropped before completion".to_string()))?;

    let data = terminal
        .data
        .into_iter()
        .map(|(vertex, ops)| {
            let ops = ops
                .into_iter()
                .map(|(op_name, payload)| (op_name, serde_json::to_string(&payload).unwrap_or_default()))
                .collect();
            (vertex, ops)
        })
        .collect();

    Ok(Json(SubmitWorkflowResponse {
        id: terminal.id,
        name: terminal.name,
        is_rollback: terminal.is_rollback,
        data,
    }))
}

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %message, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: message }))
}
