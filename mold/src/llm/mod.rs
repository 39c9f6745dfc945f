//! LLM client abstraction for the think step.
//!
//! The model itself is an external collaborator: the agent only needs a callable that takes the
//! conversation plus the published tool and mold specs and returns assistant text with optional
//! tool calls. [`MockLlm`] serves tests and examples.

mod mock;

pub use mock::MockLlm;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;
use crate::tool_source::ToolSpec;

/// Response from an LLM completion: assistant message text and optional tool calls.
///
/// **Interaction**: Returned by `LlmClient::invoke()`; [`MoldAgent::step`](crate::MoldAgent::step)
/// records it as an assistant message and dispatches `tool_calls`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Calls issued in this turn; empty means the model is done.
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    pub fn new(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }
}

/// LLM client: given messages and callable specs, returns assistant text and tool calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn. `tools` lists ordinary tools followed by molds.
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError>;
}
