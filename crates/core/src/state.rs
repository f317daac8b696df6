//! Twin-state snapshots and their components.
//!
//! A [`TwinState`] is a point-in-time view of everything the twin exposes:
//! properties, actions, events, and relationships. Snapshots are built once
//! and never mutated afterwards; a state recomputation produces a new value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single observed property of the twin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinProperty {
    pub key: String,
    /// Declared type of the value (e.g. `"double"`, `"string"`).
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: serde_json::Value,
}

impl TwinProperty {
    pub fn new(
        key: impl Into<String>,
        value_type: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        TwinProperty {
            key: key.into(),
            value_type: value_type.into(),
            value,
        }
    }

    /// Plain-text rendering of the current value. String values render bare,
    /// everything else as its JSON form.
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A command surface the twin exposes. Invoking it is fire-and-forget from
/// the gateway's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinAction {
    pub key: String,
    /// Declared input type of the action payload.
    #[serde(rename = "type")]
    pub action_type: String,
    pub content_type: String,
}

impl TwinAction {
    pub fn new(
        key: impl Into<String>,
        action_type: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        TwinAction {
            key: key.into(),
            action_type: action_type.into(),
            content_type: content_type.into(),
        }
    }
}

/// A named event the twin can fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinEvent {
    pub key: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl TwinEvent {
    pub fn new(key: impl Into<String>, event_type: impl Into<String>) -> Self {
        TwinEvent {
            key: key.into(),
            event_type: event_type.into(),
        }
    }
}

/// One concrete edge of a named relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipInstance {
    pub key: String,
    pub target_id: String,
}

impl RelationshipInstance {
    pub fn new(key: impl Into<String>, target_id: impl Into<String>) -> Self {
        RelationshipInstance {
            key: key.into(),
            target_id: target_id.into(),
        }
    }
}

/// A named relationship and its ordered instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinRelationship {
    pub name: String,
    pub instances: Vec<RelationshipInstance>,
}

impl TwinRelationship {
    pub fn new(name: impl Into<String>, instances: Vec<RelationshipInstance>) -> Self {
        TwinRelationship {
            name: name.into(),
            instances,
        }
    }
}

/// An immutable snapshot of the twin's state at one evaluation instant.
///
/// Component maps are ordered by key and keys are unique within each map.
/// Construction goes through the consuming `with_*` builders; once a snapshot
/// has been handed to an observer it is never modified — a state change
/// produces a new `TwinState`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwinState {
    evaluated_at_ms: i64,
    properties: BTreeMap<String, TwinProperty>,
    actions: BTreeMap<String, TwinAction>,
    events: BTreeMap<String, TwinEvent>,
    relationships: BTreeMap<String, TwinRelationship>,
}

impl TwinState {
    pub fn new(evaluated_at_ms: i64) -> Self {
        TwinState {
            evaluated_at_ms,
            ..TwinState::default()
        }
    }

    pub fn with_property(mut self, property: TwinProperty) -> Self {
        self.properties.insert(property.key.clone(), property);
        self
    }

    pub fn with_action(mut self, action: TwinAction) -> Self {
        self.actions.insert(action.key.clone(), action);
        self
    }

    pub fn with_event(mut self, event: TwinEvent) -> Self {
        self.events.insert(event.key.clone(), event);
        self
    }

    pub fn with_relationship(mut self, relationship: TwinRelationship) -> Self {
        self.relationships
            .insert(relationship.name.clone(), relationship);
        self
    }

    /// Epoch milliseconds of the evaluation instant.
    pub fn evaluated_at_ms(&self) -> i64 {
        self.evaluated_at_ms
    }

    pub fn property(&self, key: &str) -> Option<&TwinProperty> {
        self.properties.get(key)
    }

    pub fn action(&self, key: &str) -> Option<&TwinAction> {
        self.actions.get(key)
    }

    pub fn event(&self, key: &str) -> Option<&TwinEvent> {
        self.events.get(key)
    }

    pub fn relationship(&self, name: &str) -> Option<&TwinRelationship> {
        self.relationships.get(name)
    }

    /// All properties, ordered by key.
    pub fn properties(&self) -> impl Iterator<Item = &TwinProperty> {
        self.properties.values()
    }

    pub fn actions(&self) -> impl Iterator<Item = &TwinAction> {
        self.actions.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &TwinEvent> {
        self.events.values()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &TwinRelationship> {
        self.relationships.values()
    }

    /// Whether `key` is declared as an action in this snapshot.
    pub fn contains_action(&self, key: &str) -> bool {
        self.actions.contains_key(key)
    }

    /// Instances of a named relationship, when the relationship exists.
    pub fn relationship_instances(&self, name: &str) -> Option<&[RelationshipInstance]> {
        self.relationships.get(name).map(|r| r.instances.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_are_ordered_by_key() {
        let state = TwinState::new(1000)
            .with_property(TwinProperty::new("zeta", "double", serde_json::json!(1)))
            .with_property(TwinProperty::new("alpha", "double", serde_json::json!(2)));

        let keys: Vec<&str> = state.properties().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn duplicate_keys_keep_the_latest_value() {
        let state = TwinState::new(1000)
            .with_property(TwinProperty::new("temperature", "double", serde_json::json!(21)))
            .with_property(TwinProperty::new("temperature", "double", serde_json::json!(23)));

        assert_eq!(state.properties().count(), 1);
        assert_eq!(
            state.property("temperature").map(|p| p.value.clone()),
            Some(serde_json::json!(23))
        );
    }

    #[test]
    fn contains_action_reflects_declared_actions() {
        let state =
            TwinState::new(1000).with_action(TwinAction::new("set-target", "double", "text/plain"));
        assert!(state.contains_action("set-target"));
        assert!(!state.contains_action("reboot"));
    }

    #[test]
    fn value_text_renders_strings_bare_and_numbers_as_json() {
        let text = TwinProperty::new("mode", "string", serde_json::json!("eco"));
        let number = TwinProperty::new("temperature", "double", serde_json::json!(21));
        assert_eq!(text.value_text(), "eco");
        assert_eq!(number.value_text(), "21");
    }

    #[test]
    fn relationship_instances_for_missing_name_is_none() {
        let state = TwinState::new(1000).with_relationship(TwinRelationship::new(
            "located-in",
            vec![RelationshipInstance::new("located-in-room", "room-1")],
        ));
        assert_eq!(
            state.relationship_instances("located-in").map(<[_]>::len),
            Some(1)
        );
        assert!(state.relationship_instances("contains").is_none());
    }
}
