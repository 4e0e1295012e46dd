//! Stub operation worker.
//!
//! Subscribes to [`sagaflow::topics::WFOS`], simulates carrying out the
//! operation with a short random pause, and reports the outcome back to the
//! engine on the completed/failed topics. There is no real side effect here
//! — this crate exists to exercise the saga engine end to end without a
//! caller having to bring their own operation implementations.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sagaflow::bus::Bus;
use sagaflow::error::BusError;
use sagaflow::topics;
use sagaflow::workflow::OperationPayload;
use tracing::info;

/// Register the stub worker's subscription on `bus`.
///
/// Forward operations succeed with probability 0.8; rollback operations
/// always succeed, since a compensation that can fail would leave a saga
/// that can never finish unwinding.
pub fn subscribe<B: Bus>(bus: Arc<B>) {
    let publish_bus = bus.clone();
    bus.subscribe(
        topics::WFOS,
        Arc::new(move |bytes| {
            let bus = publish_bus.clone();
            Box::pin(async move {
                let mut event: OperationPayload =
                    serde_json::from_slice(&bytes).map_err(|e| BusError::Publish {
                        topic: topics::WFOS.into(),
                        reason: e.to_string(),
                    })?;

                if event.is_rollback {
                    info!(operation = %event.operation.name, "operation rollback is started");
                } else {
                    info!(operation = %event.operation.name, "operation is started");
                }

                let pause_ms = rand::thread_rng().gen_range(0..100);
                tokio::time::sleep(Duration::from_millis(pause_ms)).await;

                let succeeded = event.is_rollback || rand::thread_rng().gen::<f32>() < 0.8;
                event.payload = serde_json::json!(rand::thread_rng().gen::<f32>());

                let (topic, bytes) = if succeeded {
                    info!(operation = %event.operation.name, "operation is completed");
                    (topics::WFOC, serde_json::to_vec(&event))
                } else {
                    info!(operation = %event.operation.name, "operation is failed");
                    (topics::WFOF, serde_json::to_vec(&event))
                };

                let bytes = bytes.map_err(|e| BusError::Publish {
                    topic: topic.into(),
                    reason: e.to_string(),
                })?;

                bus.publish(topic, bytes).await
            })
        }),
    );
}
