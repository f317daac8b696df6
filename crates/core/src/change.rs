//! Deltas between consecutive twin-state snapshots.

use serde::{Deserialize, Serialize};

use crate::state::{RelationshipInstance, TwinAction, TwinEvent, TwinProperty, TwinRelationship};

/// What happened to a component between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Added,
    Updated,
    Removed,
}

/// The component payload a change refers to, tagged by resource kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum ChangedComponent {
    Property(TwinProperty),
    Action(TwinAction),
    Event(TwinEvent),
    Relationship(TwinRelationship),
    RelationshipInstance(RelationshipInstance),
}

impl ChangedComponent {
    /// Key (or name) identifying the component within its kind.
    pub fn key(&self) -> &str {
        match self {
            ChangedComponent::Property(p) => &p.key,
            ChangedComponent::Action(a) => &a.key,
            ChangedComponent::Event(e) => &e.key,
            ChangedComponent::Relationship(r) => &r.name,
            ChangedComponent::RelationshipInstance(i) => &i.key,
        }
    }
}

/// One delta between two consecutive snapshots.
///
/// A state update always arrives together with the ordered sequence of
/// changes that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub operation: ChangeOperation,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<ChangedComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<ChangedComponent>,
}

impl StateChange {
    pub fn added(after: ChangedComponent) -> Self {
        StateChange {
            operation: ChangeOperation::Added,
            key: after.key().to_string(),
            before: None,
            after: Some(after),
        }
    }

    pub fn updated(before: ChangedComponent, after: ChangedComponent) -> Self {
        StateChange {
            operation: ChangeOperation::Updated,
            key: after.key().to_string(),
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn removed(before: ChangedComponent) -> Self {
        StateChange {
            operation: ChangeOperation::Removed,
            key: before.key().to_string(),
            before: Some(before),
            after: None,
        }
    }
}
