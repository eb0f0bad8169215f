//! Mutation configuration.

use crate::value::{Map, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Annotation merged into every recognized workload by default.
pub const DEFAULT_ANNOTATION: (&str, &str) = ("sidecar.istio.io/inject", "true");

/// EnvEntry is the environment variable appended to each container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvEntry {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the entry in the shape of a container `env` item.
    pub fn to_value(&self) -> Value {
        let entry: Map = [("name", self.name.as_str()), ("value", self.value.as_str())]
            .into_iter()
            .collect();
        Value::Map(entry)
    }
}

impl Default for EnvEntry {
    fn default() -> Self {
        EnvEntry::new("NEW_ENV", "new-value")
    }
}

/// MutationConfig holds the fixed values the rules inject.
///
/// ```yaml
/// annotations:
///   sidecar.istio.io/inject: "true"
/// env:
///   name: NEW_ENV
///   value: new-value
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Annotations overlaid on the existing map; these win on key collision.
    pub annotations: BTreeMap<String, String>,
    pub env: EnvEntry,
}

impl Default for MutationConfig {
    fn default() -> Self {
        let (key, value) = DEFAULT_ANNOTATION;
        MutationConfig {
            annotations: BTreeMap::from([(key.to_string(), value.to_string())]),
            env: EnvEntry::default(),
        }
    }
}

/// ConfigError is a failure to load a [`MutationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl MutationConfig {
    /// Parses a YAML document. Omitted sections keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: MutationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        MutationConfig::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.env.name.is_empty() {
            return Err(ConfigError::Invalid("env.name must not be empty".into()));
        }
        if let Some(key) = self.annotations.keys().find(|k| k.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "annotation key {:?} must not be empty",
                key
            )));
        }
        Ok(())
    }
}
