//! The executable mold agent: one reasoning step plus dispatch and merge.
//!
//! [`create_mold_agent`] (or [`AgentBuilder`]) produces a [`MoldAgent`]. The agent does not
//! run the reasoning loop itself; an external runtime repeatedly calls [`MoldAgent::think`] and
//! [`MoldAgent::step`] (or runs [`ThinkNode`] and [`DispatchNode`]) until the model emits no
//! further calls.

mod builder;
mod config;
mod error;
mod nodes;
mod session;

pub use builder::{create_mold_agent, AgentBuilder};
pub use config::{ConfigError, MoldAgentConfig};
pub use error::BuildAgentError;
pub use nodes::{DispatchNode, ThinkNode};
pub use session::MoldSession;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::compose::StateShape;
use crate::dispatch::CallDispatcher;
use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::merge::StateMerger;
use crate::message::Message;
use crate::registry::MoldRegistry;
use crate::state::ComposedState;
use crate::tool_source::ToolSpec;

/// A built agent: model, registry, composed state shape, dispatcher and merger.
///
/// Immutable after build; share it across sessions through `Arc`.
pub struct MoldAgent {
    model: Arc<dyn LlmClient>,
    registry: Arc<MoldRegistry>,
    shape: Arc<StateShape>,
    tool_specs: Vec<ToolSpec>,
    dispatcher: CallDispatcher,
    merger: StateMerger,
    prompt: String,
    config: MoldAgentConfig,
}

impl MoldAgent {
    /// The state contract a runtime initializes for each session.
    pub fn shape(&self) -> &StateShape {
        &self.shape
    }

    pub fn registry(&self) -> &MoldRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MoldAgentConfig {
        &self.config
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Specs sent to the model: ordinary tools first, then molds in registration order.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tool_specs
            .iter()
            .filter(|t| !self.registry.contains(&t.name))
            .cloned()
            .chain(self.registry.molds().map(|m| m.definition().tool_spec()))
            .collect()
    }

    /// Fresh session state holding one user message.
    pub fn initial_state(&self, user_input: impl Into<String>) -> ComposedState {
        ComposedState::with_messages(vec![Message::user(user_input)])
    }

    /// Calls the model once with the conversation and all specs.
    ///
    /// When the log holds no system message, the prompt is sent first; `state` is not changed.
    pub async fn think(&self, state: &ComposedState) -> Result<LlmResponse, AgentError> {
        let needs_prompt = !self.prompt.is_empty() && !state.messages.iter().any(|m| m.is_system());
        let response = if needs_prompt {
            let mut messages = Vec::with_capacity(state.messages.len() + 1);
            messages.push(Message::system(self.prompt.clone()));
            messages.extend(state.messages.iter().cloned());
            self.model.invoke(&messages, &self.tool_specs()).await?
        } else {
            self.model.invoke(&state.messages, &self.tool_specs()).await?
        };
        debug!(
            calls = response.tool_calls.len(),
            content_len = response.content.len(),
            "model responded"
        );
        Ok(response)
    }

    /// Appends the model output as an assistant message. Calls without an id get one here so
    /// the assistant message and the tool messages agree.
    pub fn record_response(&self, state: &ComposedState, output: LlmResponse) -> ComposedState {
        let calls = output
            .tool_calls
            .into_iter()
            .map(|mut call| {
                if call.id.is_none() {
                    call.id = Some(uuid::Uuid::new_v4().to_string());
                }
                call
            })
            .collect();
        let mut next = state.clone();
        next.push_message(Message::assistant_with_calls(output.content, calls));
        next
    }

    /// The step function: record `output`, dispatch its calls and merge the batch.
    pub async fn step(
        &self,
        state: &ComposedState,
        output: LlmResponse,
    ) -> Result<ComposedState, AgentError> {
        self.step_cancellable(state, output, &CancellationToken::new())
            .await
    }

    /// Like [`step`](Self::step); a cancelled batch is discarded and `state` stays as it was.
    pub async fn step_cancellable(
        &self,
        state: &ComposedState,
        output: LlmResponse,
        cancel: &CancellationToken,
    ) -> Result<ComposedState, AgentError> {
        let recorded = self.record_response(state, output);
        self.dispatch_pending(&recorded, cancel).await
    }

    /// Dispatches the calls of the last assistant message and merges them.
    ///
    /// Returns `state` unchanged when nothing is pending.
    pub async fn dispatch_pending(
        &self,
        state: &ComposedState,
        cancel: &CancellationToken,
    ) -> Result<ComposedState, AgentError> {
        let Some(calls) = state.pending_tool_calls() else {
            return Ok(state.clone());
        };
        let requests = self.dispatcher.classify_all(calls);
        let outcomes = self.dispatcher.dispatch_cancellable(requests, cancel).await?;
        Ok(self.merger.merge(state, &outcomes))
    }

    pub(crate) fn dispatcher(&self) -> &CallDispatcher {
        &self.dispatcher
    }

    pub(crate) fn merger(&self) -> &StateMerger {
        &self.merger
    }

    pub fn think_node(self: &Arc<Self>) -> ThinkNode {
        ThinkNode::new(self.clone())
    }

    pub fn dispatch_node(self: &Arc<Self>) -> DispatchNode {
        DispatchNode::new(self.clone())
    }

    /// New session holding a fresh state with one user message.
    pub fn session(self: &Arc<Self>, user_input: impl Into<String>) -> MoldSession {
        MoldSession::new(self.clone(), self.initial_state(user_input))
    }
}

impl std::fmt::Debug for MoldAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoldAgent")
            .field("molds", &self.registry.len())
            .field("tools", &self.tool_specs.len())
            .field("fields", &self.shape.field_names())
            .field("config", &self.config)
            .finish()
    }
}
