//! Gemello HTTP gateway -- the synchronous face of an asynchronous twin.
//!
//! The twin engine pushes state recomputations and event notifications into
//! the gateway through the `StateObserver` contract; HTTP clients pull from
//! whatever the gateway last stored. Action requests and historical queries
//! flow back out through the `ActionDispatcher` and `TwinStorage` contracts.
//!
//! Endpoints:
//! - GET  /instance                              - twin id + adapter inventory
//! - GET  /state                                 - full current snapshot (500 if none yet)
//! - GET  /state/previous                        - previous snapshot (500 if none)
//! - GET  /state/changes                         - last change set (500 if none)
//! - GET  /state/properties                      - property list ([] if no snapshot)
//! - GET  /state/properties/{key}                - one property, or a not-found body
//! - GET  /state/properties/{key}/value          - plain-text current value
//! - GET  /state/actions                         - action list
//! - GET  /state/actions/{key}                   - one action
//! - POST /state/actions/{key}                   - forward an action request (202/400)
//! - GET  /state/events                          - event list
//! - GET  /state/events/{key}                    - one event
//! - GET  /state/events/notifications            - full notification log
//! - GET  /state/relationships                   - relationship list
//! - GET  /state/relationships/{key}             - one relationship
//! - GET  /state/relationships/{key}/instances   - its instances
//! - GET  /storage                               - storage statistics (404 if unavailable)
//! - POST /storage/query                         - run a historical query
//!
//! All responses are JSON except the plain-text property value read.
//!
//! The gateway imposes no timeout on the dispatcher or the storage executor:
//! their latency reaches the HTTP caller unchanged, one request at a time.

mod adapter;
mod config;
mod error;
mod handlers;
mod routes;
mod state;

pub use adapter::{ActionOutcome, HttpGateway};
pub use config::{ConfigError, GatewayConfig, KeyFilter, ResourceKind};
pub use error::GatewayError;
pub use routes::build_router;
pub use state::{GatewayState, StateCell};
