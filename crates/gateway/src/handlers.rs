//! HTTP handlers for the gateway's route table.
//!
//! Status mapping, preserved across every handler:
//! - no snapshot yet on a whole-state endpoint → 500 (the gateway is not
//!   ready, the client did nothing wrong);
//! - key absent in a present snapshot → 200 with a structured not-found body;
//! - list endpoints serve `[]` instead of failing when no snapshot exists;
//! - action accepted → 202, rejected → 400;
//! - malformed or failed query → 400, executor error → 500.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use gemello_core::{
    EventNotification, TwinAction, TwinEvent, TwinProperty, TwinRelationship, TwinState,
};
use gemello_storage::QueryRequest;

use crate::adapter::{ActionOutcome, HttpGateway};

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Shared body for single-component lookups that miss: transported with a
/// success status, distinct from transport-level unavailability.
fn component_not_found() -> Response {
    (StatusCode::OK, Json(serde_json::json!({"error": "not found"}))).into_response()
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /instance
pub(crate) async fn handle_instance(State(gateway): State<Arc<HttpGateway>>) -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!(gateway.instance())))
}

/// Assemble the whole-snapshot shape shared by /state and /state/previous.
fn state_body(state: &TwinState) -> serde_json::Value {
    serde_json::json!({
        "evaluation_instant_epoch_ms": state.evaluated_at_ms(),
        "evaluation_instant_date": format_instant(state.evaluated_at_ms()),
        "properties": state.properties().collect::<Vec<_>>(),
        "actions": state.actions().collect::<Vec<_>>(),
        "events": state.events().collect::<Vec<_>>(),
        "relationships": state.relationships().collect::<Vec<_>>(),
    })
}

fn format_instant(epoch_ms: i64) -> String {
    time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000)
        .ok()
        .and_then(|instant| {
            instant
                .format(&time::format_description::well_known::Rfc3339)
                .ok()
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// GET /state
pub(crate) async fn handle_state(State(gateway): State<Arc<HttpGateway>>) -> Response {
    match gateway.current_state() {
        Some(state) => (StatusCode::OK, Json(state_body(&state))).into_response(),
        None => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "no twin state published yet",
        )
        .into_response(),
    }
}

/// GET /state/previous
pub(crate) async fn handle_previous_state(State(gateway): State<Arc<HttpGateway>>) -> Response {
    match gateway.previous_state() {
        Some(state) => (StatusCode::OK, Json(state_body(&state))).into_response(),
        None => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "no previous twin state available",
        )
        .into_response(),
    }
}

/// GET /state/changes
pub(crate) async fn handle_state_changes(State(gateway): State<Arc<HttpGateway>>) -> Response {
    match gateway.last_changes() {
        Some(changes) => (StatusCode::OK, Json(serde_json::json!(&*changes))).into_response(),
        None => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "no state change set published yet",
        )
        .into_response(),
    }
}

/// GET /state/properties
pub(crate) async fn handle_list_properties(
    State(gateway): State<Arc<HttpGateway>>,
) -> impl IntoResponse {
    let properties: Vec<TwinProperty> = gateway
        .current_state()
        .map(|s| s.properties().cloned().collect())
        .unwrap_or_default();
    (StatusCode::OK, Json(properties))
}

/// GET /state/actions
pub(crate) async fn handle_list_actions(
    State(gateway): State<Arc<HttpGateway>>,
) -> impl IntoResponse {
    let actions: Vec<TwinAction> = gateway
        .current_state()
        .map(|s| s.actions().cloned().collect())
        .unwrap_or_default();
    (StatusCode::OK, Json(actions))
}

/// GET /state/events
pub(crate) async fn handle_list_events(
    State(gateway): State<Arc<HttpGateway>>,
) -> impl IntoResponse {
    let events: Vec<TwinEvent> = gateway
        .current_state()
        .map(|s| s.events().cloned().collect())
        .unwrap_or_default();
    (StatusCode::OK, Json(events))
}

/// GET /state/relationships
pub(crate) async fn handle_list_relationships(
    State(gateway): State<Arc<HttpGateway>>,
) -> impl IntoResponse {
    let relationships: Vec<TwinRelationship> = gateway
        .current_state()
        .map(|s| s.relationships().cloned().collect())
        .unwrap_or_default();
    (StatusCode::OK, Json(relationships))
}

/// GET /state/events/notifications
pub(crate) async fn handle_list_notifications(
    State(gateway): State<Arc<HttpGateway>>,
) -> impl IntoResponse {
    let log: Vec<EventNotification> = gateway.notifications();
    (StatusCode::OK, Json(log))
}

/// GET /state/properties/{key}
pub(crate) async fn handle_get_property(
    State(gateway): State<Arc<HttpGateway>>,
    Path(key): Path<String>,
) -> Response {
    match gateway
        .current_state()
        .and_then(|s| s.property(&key).cloned())
    {
        Some(property) => (StatusCode::OK, Json(serde_json::json!(property))).into_response(),
        None => component_not_found(),
    }
}

/// GET /state/properties/{key}/value
///
/// Plain-text rendering of the property's current value.
pub(crate) async fn handle_read_property_value(
    State(gateway): State<Arc<HttpGateway>>,
    Path(key): Path<String>,
) -> Response {
    match gateway
        .current_state()
        .and_then(|s| s.property(&key).map(TwinProperty::value_text))
    {
        Some(text) => (StatusCode::OK, text).into_response(),
        None => (StatusCode::OK, "Property not readable".to_string()).into_response(),
    }
}

/// GET /state/actions/{key}
pub(crate) async fn handle_get_action(
    State(gateway): State<Arc<HttpGateway>>,
    Path(key): Path<String>,
) -> Response {
    match gateway.current_state().and_then(|s| s.action(&key).cloned()) {
        Some(action) => (StatusCode::OK, Json(serde_json::json!(action))).into_response(),
        None => component_not_found(),
    }
}

/// POST /state/actions/{key}
///
/// The raw body travels to the engine untouched; 202 means accepted for
/// processing, nothing more.
pub(crate) async fn handle_invoke_action(
    State(gateway): State<Arc<HttpGateway>>,
    Path(key): Path<String>,
    body: String,
) -> StatusCode {
    match gateway.invoke_action(&key, body).await {
        ActionOutcome::Accepted => StatusCode::ACCEPTED,
        ActionOutcome::Rejected => StatusCode::BAD_REQUEST,
    }
}

/// GET /state/events/{key}
pub(crate) async fn handle_get_event(
    State(gateway): State<Arc<HttpGateway>>,
    Path(key): Path<String>,
) -> Response {
    match gateway.current_state().and_then(|s| s.event(&key).cloned()) {
        Some(event) => (StatusCode::OK, Json(serde_json::json!(event))).into_response(),
        None => component_not_found(),
    }
}

/// GET /state/relationships/{key}
pub(crate) async fn handle_get_relationship(
    State(gateway): State<Arc<HttpGateway>>,
    Path(key): Path<String>,
) -> Response {
    match gateway
        .current_state()
        .and_then(|s| s.relationship(&key).cloned())
    {
        Some(relationship) => {
            (StatusCode::OK, Json(serde_json::json!(relationship))).into_response()
        }
        None => component_not_found(),
    }
}

/// GET /state/relationships/{key}/instances
pub(crate) async fn handle_relationship_instances(
    State(gateway): State<Arc<HttpGateway>>,
    Path(key): Path<String>,
) -> Response {
    match gateway
        .current_state()
        .and_then(|s| s.relationship_instances(&key).map(<[_]>::to_vec))
    {
        Some(instances) => (StatusCode::OK, Json(instances)).into_response(),
        None => component_not_found(),
    }
}

/// GET /storage
pub(crate) async fn handle_storage_stats(State(gateway): State<Arc<HttpGateway>>) -> Response {
    match gateway.storage_stats().await {
        Ok(stats) => (StatusCode::OK, Json(serde_json::json!(stats))).into_response(),
        Err(e) => json_error(StatusCode::NOT_FOUND, &e.to_string()).into_response(),
    }
}

/// POST /storage/query
pub(crate) async fn handle_storage_query(
    State(gateway): State<Arc<HttpGateway>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let now_ms = now_epoch_ms();
    let request = match QueryRequest::from_body(&body, now_ms) {
        Ok(request) => request,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response(),
    };

    match gateway.execute_query(request).await {
        Ok(result) if result.success => {
            (StatusCode::OK, Json(serde_json::json!(result))).into_response()
        }
        Ok(result) => {
            let message = result.error.unwrap_or_else(|| "query failed".to_string());
            json_error(StatusCode::BAD_REQUEST, &message).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()).into_response(),
    }
}

fn now_epoch_ms() -> i64 {
    i64::try_from(time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000)
        .unwrap_or(i64::MAX)
}
