//! Configuration for building a mold agent.
//!
//! Callers pass it as the optional `config` of [`create_mold_agent`](super::create_mold_agent),
//! either built in code, parsed from a JSON mapping, or read from the environment.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::registry::FieldConflictPolicy;

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config mapping: {0}")]
    Mapping(#[from] serde_json::Error),
    #[error("invalid value for {key}: {reason}")]
    Env { key: String, reason: String },
}

/// Options recognised by the agent builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoldAgentConfig {
    /// Behavior when two molds declare one field name with different types.
    pub field_conflict_policy: FieldConflictPolicy,
    /// Run the calls of one batch concurrently (default) or one after the other.
    pub concurrent_dispatch: bool,
    /// Log the composed state shape at info level when the agent is built.
    pub debug: bool,
}

impl Default for MoldAgentConfig {
    fn default() -> Self {
        Self {
            field_conflict_policy: FieldConflictPolicy::Error,
            concurrent_dispatch: true,
            debug: false,
        }
    }
}

impl MoldAgentConfig {
    /// Parses the mapping form, e.g. `{"field_conflict_policy": "namespace"}`. Missing keys
    /// keep their defaults.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Builds config from environment variables. No variable is required.
    ///
    /// Reads: `MOLD_FIELD_CONFLICT_POLICY` (`error` | `namespace`), `MOLD_CONCURRENT_DISPATCH`
    /// and `MOLD_DEBUG` (`true` | `false`). Use after loading `.env` if desired.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("MOLD_FIELD_CONFLICT_POLICY") {
            config.field_conflict_policy =
                v.parse::<FieldConflictPolicy>()
                    .map_err(|reason| ConfigError::Env {
                        key: "MOLD_FIELD_CONFLICT_POLICY".to_string(),
                        reason,
                    })?;
        }
        if let Some(v) = env_bool("MOLD_CONCURRENT_DISPATCH")? {
            config.concurrent_dispatch = v;
        }
        if let Some(v) = env_bool("MOLD_DEBUG")? {
            config.debug = v;
        }
        Ok(config)
    }
}

fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .to_lowercase()
            .parse::<bool>()
            .map(Some)
            .map_err(|e| ConfigError::Env {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
