//! One conversation's state, with merges serialized per session.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::AgentError;
use crate::llm::LlmResponse;
use crate::message::Message;
use crate::state::ComposedState;

use super::MoldAgent;

/// Owns the [`ComposedState`] of one session.
///
/// Calls are dispatched without holding the lock; the lock is held only while a batch is
/// merged, so two merges of one session never interleave. Sessions are independent of each
/// other.
pub struct MoldSession {
    agent: Arc<MoldAgent>,
    state: Mutex<ComposedState>,
}

impl MoldSession {
    pub fn new(agent: Arc<MoldAgent>, state: ComposedState) -> Self {
        Self {
            agent,
            state: Mutex::new(state),
        }
    }

    pub fn agent(&self) -> &Arc<MoldAgent> {
        &self.agent
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> ComposedState {
        self.state.lock().await.clone()
    }

    pub async fn push_user(&self, content: impl Into<String>) {
        self.state.lock().await.push_message(Message::user(content));
    }

    /// Calls the model on the current state.
    pub async fn think(&self) -> Result<LlmResponse, AgentError> {
        let state = self.snapshot().await;
        self.agent.think(&state).await
    }

    /// Applies one model output: dispatch its calls, then record and merge under the lock.
    ///
    /// On cancellation or a fatal handler error nothing is stored.
    pub async fn apply(
        &self,
        output: LlmResponse,
        cancel: &CancellationToken,
    ) -> Result<ComposedState, AgentError> {
        let base = self.snapshot().await;
        let recorded = self.agent.record_response(&base, output);
        let outcomes = match recorded.pending_tool_calls() {
            Some(calls) => {
                let requests = self.agent.dispatcher().classify_all(calls);
                self.agent
                    .dispatcher()
                    .dispatch_cancellable(requests, cancel)
                    .await?
            }
            None => Vec::new(),
        };

        let mut state = self.state.lock().await;
        let mut current = state.clone();
        if let Some(assistant) = recorded.messages.last() {
            current.push_message(assistant.clone());
        }
        let merged = self.agent.merger().merge(&current, &outcomes);
        debug!(
            calls = outcomes.len(),
            messages = merged.messages.len(),
            "session state merged"
        );
        *state = merged.clone();
        Ok(merged)
    }
}
