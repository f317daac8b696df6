//! Declarative route table composing the gateway's HTTP surface.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::adapter::HttpGateway;
use crate::handlers::{
    handle_get_action, handle_get_event, handle_get_property, handle_get_relationship,
    handle_instance, handle_invoke_action, handle_list_actions, handle_list_events,
    handle_list_notifications, handle_list_properties, handle_list_relationships,
    handle_not_found, handle_previous_state, handle_read_property_value,
    handle_relationship_instances, handle_state, handle_state_changes, handle_storage_query,
    handle_storage_stats,
};

/// Maximum request body size: 1 MB. Action payloads and query bodies are small.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Assemble the fixed method+path table over a shared gateway.
pub fn build_router(gateway: Arc<HttpGateway>) -> Router {
    // CORS: permissive, matching the gateway's local-integration use.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/instance", get(handle_instance))
        .route("/state", get(handle_state))
        .route("/state/previous", get(handle_previous_state))
        .route("/state/changes", get(handle_state_changes))
        .route("/state/properties", get(handle_list_properties))
        .route("/state/properties/{key}", get(handle_get_property))
        .route(
            "/state/properties/{key}/value",
            get(handle_read_property_value),
        )
        .route("/state/actions", get(handle_list_actions))
        .route(
            "/state/actions/{key}",
            get(handle_get_action).post(handle_invoke_action),
        )
        .route("/state/events", get(handle_list_events))
        .route("/state/events/{key}", get(handle_get_event))
        .route("/state/events/notifications", get(handle_list_notifications))
        .route("/state/relationships", get(handle_list_relationships))
        .route("/state/relationships/{key}", get(handle_get_relationship))
        .route(
            "/state/relationships/{key}/instances",
            get(handle_relationship_instances),
        )
        .route("/storage", get(handle_storage_stats))
        .route("/storage/query", post(handle_storage_query))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(gateway)
}
