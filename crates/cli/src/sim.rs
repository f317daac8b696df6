//! Simulated twin wiring for `gemello serve`.
//!
//! Stands in for a real twin engine: recomputes a small state at a fixed
//! cadence with random physical variations, fires an event when a threshold
//! is crossed, and records everything into the in-memory storage executor so
//! the query endpoints have data to answer with.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

use gemello_core::{
    ActionDispatcher, ChangedComponent, DispatchError, EventNotification, RelationshipInstance,
    StateChange, StateObserver, TwinAction, TwinEvent, TwinInstance, TwinProperty,
    TwinRelationship, TwinState,
};
use gemello_gateway::{GatewayConfig, HttpGateway};
use gemello_storage::{InMemoryTwinStorage, TwinStorage};

/// Temperature above which the simulated twin fires its alert event.
const OVER_TEMPERATURE_C: f64 = 24.0;

/// Build the demo wiring, start the gateway, and serve until Ctrl+C.
pub async fn run(
    id: String,
    host: String,
    port: u16,
    interval_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Arc::new(InMemoryTwinStorage::new());
    let dispatcher = Arc::new(LoggingDispatcher);

    let adapter_id = format!("{id}-http");
    let config = GatewayConfig::new(&adapter_id, host, port);
    let instance = TwinInstance {
        id: id.clone(),
        digitalized_physical_assets: vec!["demo-asset".to_string()],
        physical_adapters: vec!["sim-pa".to_string()],
        digital_adapters: vec![adapter_id],
    };

    let gateway = Arc::new(HttpGateway::new(
        config,
        instance,
        dispatcher as Arc<dyn ActionDispatcher>,
        Some(Arc::clone(&storage) as Arc<dyn TwinStorage>),
    ));

    let addr = gateway.start().await?;
    info!("serving simulated twin '{id}' on http://{addr}");

    let simulation = tokio::spawn(simulate(
        Arc::clone(&gateway),
        storage,
        Duration::from_secs(interval_secs.max(1)),
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    simulation.abort();
    gateway.stop().await;
    Ok(())
}

/// Stand-in for the engine's action pipeline: accepts everything and logs it.
struct LoggingDispatcher;

#[async_trait]
impl ActionDispatcher for LoggingDispatcher {
    async fn submit_action(&self, action_key: &str, body: String) -> Result<(), DispatchError> {
        info!(action = action_key, body = %body, "action submitted to simulated engine");
        Ok(())
    }
}

/// Recompute the simulated state forever, pushing each snapshot into the
/// gateway and recording history into the storage executor.
async fn simulate(
    gateway: Arc<HttpGateway>,
    storage: Arc<InMemoryTwinStorage>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut temperature = 21.0_f64;
    let mut previous: Option<TwinState> = None;

    loop {
        ticker.tick().await;

        let delta: f64 = rand::thread_rng().gen_range(-0.5..=0.5);
        temperature = (temperature + delta).clamp(15.0, 30.0);
        let now_ms = now_epoch_ms();

        let state = build_state(now_ms, temperature);
        let changes = diff_temperature(previous.as_ref(), &state);

        storage.record_property("temperature", serde_json::json!(temperature), now_ms);
        storage.record_state(
            serde_json::json!({
                "evaluation_instant_epoch_ms": now_ms,
                "temperature": temperature,
            }),
            now_ms,
        );

        gateway.on_state_update(state.clone(), previous.take(), changes);
        previous = Some(state);

        if temperature > OVER_TEMPERATURE_C {
            warn!(temperature, "over-temperature threshold crossed");
            let notification = EventNotification::new(
                "over-temperature",
                serde_json::json!({"temperature": temperature}),
                now_ms,
            );
            storage.record_notification(serde_json::json!(notification), now_ms);
            gateway.on_event_notification(notification);
        }
    }
}

fn build_state(now_ms: i64, temperature: f64) -> TwinState {
    TwinState::new(now_ms)
        .with_property(TwinProperty::new(
            "temperature",
            "double",
            serde_json::json!(temperature),
        ))
        .with_action(TwinAction::new(
            "set-target-temperature",
            "double",
            "text/plain",
        ))
        .with_event(TwinEvent::new("over-temperature", "alert"))
        .with_relationship(TwinRelationship::new(
            "located-in",
            vec![RelationshipInstance::new("located-in-room", "room-1")],
        ))
}

fn diff_temperature(previous: Option<&TwinState>, next: &TwinState) -> Vec<StateChange> {
    let next_property = match next.property("temperature") {
        Some(p) => p.clone(),
        None => return Vec::new(),
    };
    match previous.and_then(|p| p.property("temperature")) {
        Some(before) => vec![StateChange::updated(
            ChangedComponent::Property(before.clone()),
            ChangedComponent::Property(next_property),
        )],
        None => vec![StateChange::added(ChangedComponent::Property(
            next_property,
        ))],
    }
}

fn now_epoch_ms() -> i64 {
    i64::try_from(time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000)
        .unwrap_or(i64::MAX)
}
