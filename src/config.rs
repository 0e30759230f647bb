//! Configuration for process models and handle maps.
//!
//! Every type here deserializes from JSON with missing fields taking their defaults, so
//! a configuration file only needs to mention what it changes:
//!
//! ```rust
//! use procgraph::config::{Config, FanOutPolicy};
//!
//! let config = Config::from_json(r#"{ "model": { "fan_out": "deferred" } }"#).unwrap();
//! assert_eq!(config.model.fan_out, FanOutPolicy::Deferred);
//! assert_eq!(config.handles.initial_capacity, 8);
//! ```

use crate::error::{ConfigError, HandleError};
use crate::handle::{DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
use crate::model::NodeKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How a model treats nodes that collect more successors than their kind allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutPolicy {
    /// Every link edit enforces the successor limit of the node kind.
    #[default]
    Strict,
    /// Start, activity and join nodes may hold several successors until
    /// [`ProcessModel::normalize`](crate::model::ProcessModel::normalize) inserts splits.
    Deferred,
}

/// Prefixes used for ids the model generates for nodes added without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdPrefixes {
    pub start: String,
    pub activity: String,
    pub split: String,
    pub join: String,
    pub end: String,
}

impl IdPrefixes {
    pub fn for_kind(&self, kind: &NodeKind) -> &str {
        match kind {
            NodeKind::Start => &self.start,
            NodeKind::Activity(_) => &self.activity,
            NodeKind::Split(_) => &self.split,
            NodeKind::Join(_) => &self.join,
            NodeKind::End => &self.end,
        }
    }
}

impl Default for IdPrefixes {
    fn default() -> Self {
        Self {
            start: "start".to_string(),
            activity: "ac".to_string(),
            split: "split".to_string(),
            join: "join".to_string(),
            end: "end".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub fan_out: FanOutPolicy,
    pub id_prefix: IdPrefixes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleMapConfig {
    pub initial_capacity: usize,
    pub load_factor: f32,
}

impl HandleMapConfig {
    pub fn validate(&self) -> Result<(), HandleError> {
        if self.initial_capacity == 0 {
            return Err(HandleError::InvalidConfig(
                "initial_capacity must be at least 1".to_string(),
            ));
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(HandleError::InvalidConfig(format!(
                "load_factor must be in (0, 1], got {}",
                self.load_factor
            )));
        }
        Ok(())
    }
}

impl Default for HandleMapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

/// The complete library configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub handles: HandleMapConfig,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.handles.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}
