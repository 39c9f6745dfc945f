//! Graph nodes wrapping the agent for an external runtime: think, then dispatch, until done.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::state::ComposedState;

use super::MoldAgent;

/// Think node: calls the model and appends its assistant message.
///
/// Returns `Next::End` when the model issued no calls, else `Next::Continue` (the runtime's
/// linear edge leads to [`DispatchNode`]).
pub struct ThinkNode {
    agent: Arc<MoldAgent>,
}

impl ThinkNode {
    pub fn new(agent: Arc<MoldAgent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Node<ComposedState> for ThinkNode {
    fn id(&self) -> &str {
        "think"
    }

    async fn run(&self, state: ComposedState) -> Result<(ComposedState, Next), AgentError> {
        let response = self.agent.think(&state).await?;
        let done = response.tool_calls.is_empty();
        let state = self.agent.record_response(&state, response);
        let next = if done { Next::End } else { Next::Continue };
        Ok((state, next))
    }
}

/// Dispatch node: runs the pending calls of the last assistant message, merges them and
/// jumps back to `"think"`. Ends when nothing is pending.
pub struct DispatchNode {
    agent: Arc<MoldAgent>,
    cancel: CancellationToken,
}

impl DispatchNode {
    pub fn new(agent: Arc<MoldAgent>) -> Self {
        Self {
            agent,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelling `cancel` discards the in-flight batch with [`AgentError::Cancelled`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl Node<ComposedState> for DispatchNode {
    fn id(&self) -> &str {
        "dispatch"
    }

    async fn run(&self, state: ComposedState) -> Result<(ComposedState, Next), AgentError> {
        if state.pending_tool_calls().is_none() {
            return Ok((state, Next::End));
        }
        let state = self.agent.dispatch_pending(&state, &self.cancel).await?;
        Ok((state, Next::Node("think".to_string())))
    }
}
