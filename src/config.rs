//! Configuration for containers and applications.
//!
//! Values come from a [`ConfigSource`]: the process environment (variables
//! prefixed with `BOOTKIT_`), an in-memory map, or, with the `config` feature,
//! a JSON document deserialized straight into [`AppConfig`].

use std::collections::HashMap;
use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use crate::error::{DiError, DiResult};

/// Environment prefix read by [`AppConfig::from_env`].
pub const ENV_PREFIX: &str = "BOOTKIT";

/// A configuration value, parsed from its textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl ConfigValue {
    /// Parses `true`/`false`, then integers, and keeps anything else as text.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if let Ok(flag) = raw.parse::<bool>() {
            ConfigValue::Boolean(flag)
        } else if let Ok(int) = raw.parse::<i64>() {
            ConfigValue::Integer(int)
        } else {
            ConfigValue::String(raw)
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Renders the value back to text, e.g. for a name that looks numeric.
    pub fn to_text(&self) -> String {
        match self {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Integer(i) => i.to_string(),
            ConfigValue::Boolean(b) => b.to_string(),
        }
    }
}

/// A source of configuration values keyed by lowercase names.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Option<ConfigValue>;
}

/// Reads `PREFIX_KEY` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        env::var(self.env_key(key)).ok().map(ConfigValue::parse)
    }
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, raw: impl Into<String>) -> Self {
        self.values.insert(key.into(), ConfigValue::parse(raw));
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }
}

/// Container settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Name used in log events
    pub name: String,
    /// Log the computed dependency order on start
    pub log_order: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "container".to_string(),
            log_order: true,
        }
    }
}

impl ContainerConfig {
    /// Reads `container_name` and `log_order`, keeping defaults for anything
    /// missing or malformed.
    pub fn load(source: &dyn ConfigSource) -> Self {
        let mut config = Self::default();
        if let Some(name) = source.get("container_name") {
            config.name = name.to_text();
        }
        if let Some(value) = source.get("log_order") {
            match value.as_bool() {
                Some(flag) => config.log_order = flag,
                None => tracing::warn!(value = ?value, "ignoring non-boolean log_order"),
            }
        }
        config
    }
}

/// Application settings: a name plus the container's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AppConfig {
    pub name: String,
    pub container: ContainerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            container: ContainerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(source: &dyn ConfigSource) -> Self {
        Self {
            name: source
                .get("name")
                .map(|name| name.to_text())
                .unwrap_or_else(|| Self::default().name),
            container: ContainerConfig::load(source),
        }
    }

    /// Loads from `BOOTKIT_NAME`, `BOOTKIT_CONTAINER_NAME` and
    /// `BOOTKIT_LOG_ORDER`.
    pub fn from_env() -> Self {
        Self::load(&EnvironmentConfigSource::with_prefix(ENV_PREFIX))
    }

    /// Parses a JSON document; missing fields keep their defaults.
    ///
    /// ```
    /// # #[cfg(feature = "config")]
    /// # {
    /// let config = bootkit::AppConfig::from_json(r#"{"name": "billing"}"#).unwrap();
    /// assert_eq!(config.name, "billing");
    /// assert!(config.container.log_order);
    /// # }
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|err| DiError::Config(err.to_string()))
    }
}
