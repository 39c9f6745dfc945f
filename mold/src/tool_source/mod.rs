//! Tool source abstraction: list tools and call a tool.
//!
//! Ordinary tools are executed entirely by the caller's [`ToolSource`]; the dispatcher only
//! routes calls to it. Implementations: [`MockToolSource`] (tests), [`NoToolSource`] (agents
//! with molds only), or any adapter the caller provides (MCP, HTTP, ...).

mod mock;

pub use mock::MockToolSource;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tool specification, aligned with MCP `tools/list` result item.
///
/// Molds are published to the model with the same shape (see
/// [`MoldDefinition::tool_spec`](crate::MoldDefinition::tool_spec)).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    /// Tool name (e.g. used in MCP tools/call).
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: Option<String>,
    /// JSON Schema for arguments (MCP inputSchema).
    pub input_schema: Value,
}

/// Result of a single tool call; aligns with MCP `tools/call` content.
#[derive(Debug, Clone)]
pub struct ToolCallContent {
    /// Result text (e.g. from MCP result.content[].text).
    pub text: String,
}

/// Errors from listing or calling tools.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Tool source: list tools and call a tool.
///
/// The agent builder calls `list_tools` once to learn the tool names; the dispatcher calls
/// `call_tool` for every routed tool call, possibly from several tasks at once.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// List available tools (e.g. MCP tools/list).
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    /// Call a tool by name with JSON arguments (e.g. MCP tools/call).
    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError>;
}

/// Tool source with no tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToolSource;

#[async_trait]
impl ToolSource for NoToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(vec![])
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        Err(ToolSourceError::NotFound(name.to_string()))
    }
}
