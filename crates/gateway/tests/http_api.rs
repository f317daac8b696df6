//! End-to-end coverage over a live gateway: real sockets, real JSON.
//!
//! The server runs on an ephemeral port inside a manually built runtime;
//! requests are driven with a blocking `ureq` agent configured to report
//! status codes instead of turning them into errors.

use std::sync::{Arc, Mutex};

use gemello_core::{
    ActionDispatcher, ChangedComponent, DispatchError, EventNotification, RelationshipInstance,
    StateChange, StateObserver, TwinAction, TwinInstance, TwinProperty, TwinRelationship,
    TwinState,
};
use gemello_gateway::{GatewayConfig, HttpGateway};
use gemello_storage::{InMemoryTwinStorage, TwinStorage};

struct RecordingDispatcher {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingDispatcher {
    fn new() -> Arc<Self> {
        Arc::new(RecordingDispatcher {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ActionDispatcher for RecordingDispatcher {
    async fn submit_action(&self, action_key: &str, body: String) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .unwrap()
            .push((action_key.to_string(), body));
        Ok(())
    }
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

fn twin_instance() -> TwinInstance {
    TwinInstance {
        id: "test-twin".to_string(),
        digitalized_physical_assets: vec!["test-asset".to_string()],
        physical_adapters: vec!["test-pa".to_string()],
        digital_adapters: vec!["test-http-gw".to_string()],
    }
}

fn first_snapshot() -> TwinState {
    TwinState::new(1_000)
        .with_property(TwinProperty::new(
            "temperature",
            "double",
            serde_json::json!(21),
        ))
        .with_action(TwinAction::new(
            "set-target-temperature",
            "double",
            "text/plain",
        ))
        .with_relationship(TwinRelationship::new(
            "located-in",
            vec![RelationshipInstance::new("located-in-room", "room-1")],
        ))
}

#[test]
fn http_surface_end_to_end() {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let dispatcher = RecordingDispatcher::new();
    let storage = Arc::new(InMemoryTwinStorage::new());
    storage.record_property("temperature", serde_json::json!(21.0), 100);
    storage.record_property("temperature", serde_json::json!(23.0), 200);

    let gateway = Arc::new(HttpGateway::new(
        GatewayConfig::new("test-http-gw", "127.0.0.1", 0),
        twin_instance(),
        Arc::clone(&dispatcher) as Arc<dyn ActionDispatcher>,
        Some(Arc::clone(&storage) as Arc<dyn TwinStorage>),
    ));

    let addr = rt.block_on(gateway.start()).unwrap();
    let base = format!("http://{addr}");
    let agent = agent();

    // Before any publish: whole-state endpoints fail server-side, lists are empty.
    let res = agent.get(&format!("{base}/state")).call().unwrap();
    assert_eq!(res.status().as_u16(), 500);
    let res = agent.get(&format!("{base}/state/changes")).call().unwrap();
    assert_eq!(res.status().as_u16(), 500);
    let res = agent
        .get(&format!("{base}/state/properties"))
        .call()
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body, serde_json::json!([]));

    // Instance inventory is available regardless of twin state.
    let res = agent.get(&format!("{base}/instance")).call().unwrap();
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body["id"], "test-twin");
    assert_eq!(body["digital_adapters"][0], "test-http-gw");

    // First state update.
    gateway.on_state_update(
        first_snapshot(),
        None,
        vec![StateChange::added(ChangedComponent::Property(
            TwinProperty::new("temperature", "double", serde_json::json!(21)),
        ))],
    );

    let res = agent.get(&format!("{base}/state")).call().unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body["evaluation_instant_epoch_ms"], 1_000);
    assert_eq!(body["properties"][0]["key"], "temperature");

    let res = agent
        .get(&format!("{base}/state/properties/temperature/value"))
        .call()
        .unwrap();
    assert_eq!(res.into_body().read_to_string().unwrap(), "21");

    // Second state update shifts the first snapshot to /state/previous.
    let second = TwinState::new(2_000)
        .with_property(TwinProperty::new(
            "temperature",
            "double",
            serde_json::json!(23),
        ))
        .with_action(TwinAction::new(
            "set-target-temperature",
            "double",
            "text/plain",
        ));
    gateway.on_state_update(
        second,
        None,
        vec![StateChange::updated(
            ChangedComponent::Property(TwinProperty::new(
                "temperature",
                "double",
                serde_json::json!(21),
            )),
            ChangedComponent::Property(TwinProperty::new(
                "temperature",
                "double",
                serde_json::json!(23),
            )),
        )],
    );

    let res = agent
        .get(&format!("{base}/state/properties/temperature/value"))
        .call()
        .unwrap();
    assert_eq!(res.into_body().read_to_string().unwrap(), "23");

    let res = agent.get(&format!("{base}/state/previous")).call().unwrap();
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body["properties"][0]["value"], 21);

    let res = agent.get(&format!("{base}/state/changes")).call().unwrap();
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body[0]["operation"], "updated");
    assert_eq!(body[0]["key"], "temperature");

    // Unknown keys answer with a not-found body on a success status.
    let res = agent
        .get(&format!("{base}/state/properties/pressure"))
        .call()
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body["error"], "not found");

    let res = agent
        .get(&format!("{base}/state/properties/pressure/value"))
        .call()
        .unwrap();
    assert_eq!(
        res.into_body().read_to_string().unwrap(),
        "Property not readable"
    );

    // Relationship instances come back as a bare list.
    let res = agent.get(&format!("{base}/state/relationships")).call().unwrap();
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body, serde_json::json!([]));
    gateway.on_state_update(first_snapshot(), None, Vec::new());
    let res = agent
        .get(&format!("{base}/state/relationships/located-in/instances"))
        .call()
        .unwrap();
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body[0]["target_id"], "room-1");

    // Action forwarding: declared key is accepted and forwarded once.
    let res = agent
        .post(&format!("{base}/state/actions/set-target-temperature"))
        .send("23.5")
        .unwrap();
    assert_eq!(res.status().as_u16(), 202);
    assert_eq!(
        dispatcher.calls(),
        vec![("set-target-temperature".to_string(), "23.5".to_string())]
    );

    let res = agent
        .post(&format!("{base}/state/actions/reboot"))
        .send("now")
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(dispatcher.calls().len(), 1);

    // Event notifications accumulate in arrival order.
    gateway.on_event_notification(EventNotification::new(
        "over-temperature",
        serde_json::json!({"temperature": 25.5}),
        2_500,
    ));
    let res = agent
        .get(&format!("{base}/state/events/notifications"))
        .call()
        .unwrap();
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body[0]["event_key"], "over-temperature");

    // Storage statistics and queries go through the attached executor.
    let res = agent.get(&format!("{base}/storage")).call().unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body["property_count"], 2);

    let res = agent
        .post(&format!("{base}/storage/query"))
        .send_json(serde_json::json!({
            "resourceType": "PROPERTY",
            "queryType": "SAMPLE_RANGE",
            "startIndex": 0,
            "endIndex": 2,
        }))
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: serde_json::Value = res.into_body().read_json().unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["records"].as_array().map(Vec::len), Some(2));

    // A query the executor understands but cannot satisfy is a client error.
    let res = agent
        .post(&format!("{base}/storage/query"))
        .send_json(serde_json::json!({
            "resourceType": "PROPERTY",
            "queryType": "TIME_RANGE",
            "startTimestampMs": 500,
            "endTimestampMs": 100,
        }))
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    // A body missing a mandatory field is malformed.
    let res = agent
        .post(&format!("{base}/storage/query"))
        .send_json(serde_json::json!({"resourceType": "PROPERTY"}))
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    // Unmatched routes fall through to the JSON 404.
    let res = agent.get(&format!("{base}/nowhere")).call().unwrap();
    assert_eq!(res.status().as_u16(), 404);

    rt.block_on(gateway.stop());
    assert!(agent.get(&format!("{base}/instance")).call().is_err());
}

#[test]
fn storage_endpoints_without_an_executor() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let gateway = Arc::new(HttpGateway::new(
        GatewayConfig::new("bare-gw", "127.0.0.1", 0),
        twin_instance(),
        RecordingDispatcher::new() as Arc<dyn ActionDispatcher>,
        None,
    ));

    let addr = rt.block_on(gateway.start()).unwrap();
    let base = format!("http://{addr}");
    let agent = agent();

    let res = agent.get(&format!("{base}/storage")).call().unwrap();
    assert_eq!(res.status().as_u16(), 404);

    let res = agent
        .post(&format!("{base}/storage/query"))
        .send_json(serde_json::json!({
            "resourceType": "PROPERTY",
            "queryType": "COUNT",
        }))
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    rt.block_on(gateway.stop());
}
