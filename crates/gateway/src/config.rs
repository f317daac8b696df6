//! Gateway configuration: identity, bind address, resource whitelists.
//!
//! Filters are whitelists over the keys a twin surfaces through this
//! gateway. An empty filter admits every key of its kind; a non-empty
//! filter admits only the listed keys. Filters are assembled before the
//! gateway starts and are immutable afterwards — the gateway consumes the
//! configuration by value at construction.

use std::fmt;

/// The four resource kinds a whitelist filter can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Property,
    Action,
    Event,
    Relationship,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Property => "property",
            ResourceKind::Action => "action",
            ResourceKind::Event => "event",
            ResourceKind::Relationship => "relationship",
        };
        f.write_str(name)
    }
}

/// Errors raised while assembling a [`GatewayConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot use an empty key as a {kind} filter")]
    EmptyFilterKey { kind: ResourceKind },

    #[error("cannot use an empty list of keys as a {kind} filter")]
    EmptyFilterList { kind: ResourceKind },
}

/// Whitelist over resource keys. An empty filter admits every key.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter(Vec<String>);

impl KeyFilter {
    /// Whether `key` passes this filter.
    pub fn includes(&self, key: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|k| k == key)
    }

    /// Whether this filter admits everything.
    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    fn add(&mut self, kind: ResourceKind, key: String) -> Result<(), ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::EmptyFilterKey { kind });
        }
        self.0.push(key);
        Ok(())
    }

    fn add_many<I>(&mut self, kind: ResourceKind, keys: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let keys: Vec<String> = keys.into_iter().collect();
        if keys.is_empty() {
            return Err(ConfigError::EmptyFilterList { kind });
        }
        if keys.iter().any(String::is_empty) {
            return Err(ConfigError::EmptyFilterKey { kind });
        }
        self.0.extend(keys);
        Ok(())
    }
}

/// Configuration of one gateway instance.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    id: String,
    host: String,
    port: u16,
    property_filter: KeyFilter,
    action_filter: KeyFilter,
    event_filter: KeyFilter,
    relationship_filter: KeyFilter,
}

impl GatewayConfig {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        GatewayConfig {
            id: id.into(),
            host: host.into(),
            port,
            property_filter: KeyFilter::default(),
            action_filter: KeyFilter::default(),
            event_filter: KeyFilter::default(),
            relationship_filter: KeyFilter::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn add_property_filter(&mut self, key: impl Into<String>) -> Result<(), ConfigError> {
        self.property_filter.add(ResourceKind::Property, key.into())
    }

    pub fn add_properties_filter<I>(&mut self, keys: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        self.property_filter.add_many(ResourceKind::Property, keys)
    }

    pub fn add_action_filter(&mut self, key: impl Into<String>) -> Result<(), ConfigError> {
        self.action_filter.add(ResourceKind::Action, key.into())
    }

    pub fn add_actions_filter<I>(&mut self, keys: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        self.action_filter.add_many(ResourceKind::Action, keys)
    }

    pub fn add_event_filter(&mut self, key: impl Into<String>) -> Result<(), ConfigError> {
        self.event_filter.add(ResourceKind::Event, key.into())
    }

    pub fn add_events_filter<I>(&mut self, keys: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        self.event_filter.add_many(ResourceKind::Event, keys)
    }

    pub fn add_relationship_filter(&mut self, key: impl Into<String>) -> Result<(), ConfigError> {
        self.relationship_filter
            .add(ResourceKind::Relationship, key.into())
    }

    pub fn add_relationships_filter<I>(&mut self, keys: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        self.relationship_filter
            .add_many(ResourceKind::Relationship, keys)
    }

    /// Whether `key` is surfaced for the given resource kind.
    pub fn included(&self, kind: ResourceKind, key: &str) -> bool {
        self.filter(kind).includes(key)
    }

    /// Whether every filter admits everything.
    pub fn is_unrestricted(&self) -> bool {
        [
            ResourceKind::Property,
            ResourceKind::Action,
            ResourceKind::Event,
            ResourceKind::Relationship,
        ]
        .iter()
        .all(|kind| self.filter(*kind).is_unrestricted())
    }

    fn filter(&self, kind: ResourceKind) -> &KeyFilter {
        match kind {
            ResourceKind::Property => &self.property_filter,
            ResourceKind::Action => &self.action_filter,
            ResourceKind::Event => &self.event_filter,
            ResourceKind::Relationship => &self.relationship_filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_admits_every_key() {
        let config = GatewayConfig::new("gw", "127.0.0.1", 3000);
        assert!(config.included(ResourceKind::Property, "temperature"));
        assert!(config.included(ResourceKind::Event, "anything-at-all"));
        assert!(config.is_unrestricted());
    }

    #[test]
    fn non_empty_filter_admits_only_listed_keys() {
        let mut config = GatewayConfig::new("gw", "127.0.0.1", 3000);
        config.add_property_filter("temperature").unwrap();
        config
            .add_properties_filter(vec!["humidity".to_string()])
            .unwrap();

        assert!(config.included(ResourceKind::Property, "temperature"));
        assert!(config.included(ResourceKind::Property, "humidity"));
        assert!(!config.included(ResourceKind::Property, "pressure"));
        // Other kinds stay unrestricted.
        assert!(config.included(ResourceKind::Action, "set-target"));
        assert!(!config.is_unrestricted());
    }

    #[test]
    fn empty_keys_are_rejected() {
        let mut config = GatewayConfig::new("gw", "127.0.0.1", 3000);
        assert!(matches!(
            config.add_event_filter(""),
            Err(ConfigError::EmptyFilterKey { .. })
        ));
        assert!(matches!(
            config.add_actions_filter(Vec::new()),
            Err(ConfigError::EmptyFilterList { .. })
        ));
    }
}
