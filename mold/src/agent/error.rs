//! Error type when building a [`MoldAgent`](super::MoldAgent).

use crate::registry::RegistryError;
use crate::tool_source::ToolSourceError;

use super::config::ConfigError;

/// Error when building a [`MoldAgent`](super::MoldAgent) from molds, tools and config.
#[derive(Debug, thiserror::Error)]
pub enum BuildAgentError {
    #[error("mold registration failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to list tools: {0}")]
    Tools(#[from] ToolSourceError),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}
