//! Contracts at the twin-engine boundary.
//!
//! The engine pushes state into the gateway through [`StateObserver`] and
//! receives commands back through [`ActionDispatcher`]. Everything else the
//! engine does — shadowing, reconciliation, persistence — is opaque here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::change::StateChange;
use crate::event::EventNotification;
use crate::state::TwinState;

/// Identity and adapter inventory of a running twin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinInstance {
    pub id: String,
    pub digitalized_physical_assets: Vec<String>,
    pub physical_adapters: Vec<String>,
    pub digital_adapters: Vec<String>,
}

/// Errors raised while submitting an action request to the engine.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The engine's action pipeline refused the request.
    #[error("action '{action_key}' refused by the engine: {message}")]
    Refused { action_key: String, message: String },

    /// The engine could not be reached at all.
    #[error("engine unreachable: {0}")]
    Unreachable(String),
}

/// Inbound push contract, implemented by a digital adapter.
///
/// The engine invokes these callbacks from its own computation threads at a
/// cadence the adapter does not control; implementations must be safe to call
/// concurrently with their own readers and must not block the engine.
pub trait StateObserver: Send + Sync {
    /// Called exactly once per state recomputation with the freshly evaluated
    /// snapshot, the state it replaced, and the ordered changes in between.
    fn on_state_update(
        &self,
        new_state: TwinState,
        previous: Option<TwinState>,
        changes: Vec<StateChange>,
    );

    /// Called once per event firing.
    fn on_event_notification(&self, notification: EventNotification);
}

/// Outbound action-submission contract of the twin engine.
///
/// Submission is fire-and-forget: a successful return means the request was
/// accepted into the engine's action pipeline, not that it was executed.
#[async_trait]
pub trait ActionDispatcher: Send + Sync + 'static {
    async fn submit_action(&self, action_key: &str, body: String) -> Result<(), DispatchError>;
}
