//! Core data model for the Gemello digital-twin gateway.
//!
//! A twin engine merges physical observations into immutable [`TwinState`]
//! snapshots and pushes each one, together with the ordered [`StateChange`]
//! records that produced it, into any registered [`StateObserver`]. Event
//! firings arrive the same way as [`EventNotification`] values. Commands
//! travel the opposite direction through an [`ActionDispatcher`].
//!
//! This crate holds only the model and the boundary contracts; the engine
//! itself and the HTTP surface live elsewhere.

mod change;
mod engine;
mod event;
mod state;

pub use change::{ChangeOperation, ChangedComponent, StateChange};
pub use engine::{ActionDispatcher, DispatchError, StateObserver, TwinInstance};
pub use event::EventNotification;
pub use state::{
    RelationshipInstance, TwinAction, TwinEvent, TwinProperty, TwinRelationship, TwinState,
};
