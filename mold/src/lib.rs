//! # Mold
//!
//! Schema-typed callables ("molds") for tool-calling agents. A mold looks like a tool to the
//! model, but instead of performing an external action it structures data into the shared
//! conversation state.
//!
//! ## Design principles
//!
//! - **Schemas are declared, not inferred**: each mold carries a [`SchemaDescriptor`] built once
//!   at registration ([`SchemaDescriptor::builder`] or [`MoldInput::input_type`]).
//! - **One composed state**: [`StateComposer`] derives a single [`StateShape`] from all
//!   registered molds at build time. Field conflicts are build errors, not runtime surprises.
//! - **One step per call**: the agent exposes a step function ([`MoldAgent::step`]) and graph
//!   nodes ([`ThinkNode`], [`DispatchNode`]); the reasoning loop belongs to the caller's runtime.
//! - **Per-field merge policy**: scalars and records are last-writer-wins, collections and the
//!   message log append ([`MergePolicy`]).
//!
//! ## Main modules
//!
//! - [`schema`]: [`SchemaDescriptor`], [`FieldType`], [`validate`], JSON Schema rendering.
//! - [`definition`]: [`MoldDefinition`], [`MoldHandler`], [`UpdateCommand`].
//! - [`registry`]: [`MoldRegistry`], [`FieldConflictPolicy`], [`RegistryError`].
//! - [`compose`]: [`StateComposer`], [`StateShape`].
//! - [`dispatch`]: [`CallDispatcher`], [`CallRequest`], [`DispatchOutcome`], [`CallError`].
//! - [`merge`]: [`StateMerger`].
//! - [`agent`]: [`create_mold_agent`], [`AgentBuilder`], [`MoldAgent`], [`MoldSession`],
//!   [`MoldAgentConfig`].
//! - [`graph`], [`llm`], [`tool_source`]: collaborator contracts ([`Node`], [`LlmClient`],
//!   [`ToolSource`]) with mocks for tests.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mold::{
//!     create_mold_agent, FieldType, LlmResponse, MockLlm, MoldDefinition, SchemaDescriptor,
//!     ToolCall,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = SchemaDescriptor::builder()
//!     .required("city", FieldType::String)
//!     .required("temperature", FieldType::Number)
//!     .build()?;
//! let weather = MoldDefinition::structured("weather_report", "Record a weather report", schema);
//!
//! let call = ToolCall::new("weather_report", r#"{"city":"Seattle","temperature":61.0}"#, "c1");
//! let llm = MockLlm::scripted(vec![LlmResponse::new("", vec![call])]);
//! let agent = create_mold_agent(Arc::new(llm), None, vec![weather], "Be brief.", None).await?;
//!
//! let state = agent.initial_state("Weather in Seattle?");
//! let output = agent.think(&state).await?;
//! let state = agent.step(&state, output).await?;
//! assert_eq!(state.get("city"), Some(&serde_json::json!("Seattle")));
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod channels;
pub mod compose;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod llm;
pub mod merge;
pub mod message;
pub mod registry;
pub mod schema;
pub mod state;
pub mod tool_source;

pub use agent::{
    create_mold_agent, AgentBuilder, BuildAgentError, ConfigError, DispatchNode, MoldAgent,
    MoldAgentConfig, MoldSession, ThinkNode,
};
pub use channels::{Channel, LastValue, Topic};
pub use compose::{MergePolicy, StateComposer, StateField, StateShape, MESSAGES_FIELD};
pub use definition::{
    HandlerError, MoldDefinition, MoldHandler, UpdateCommand, MOLD_DESCRIPTION_PREFIX,
};
pub use dispatch::{CallDispatcher, CallError, CallKind, CallOutput, CallRequest, DispatchOutcome};
pub use error::AgentError;
pub use graph::{Next, Node};
pub use llm::{LlmClient, LlmResponse, MockLlm};
pub use merge::StateMerger;
pub use message::Message;
pub use registry::{FieldConflictPolicy, MoldRegistry, RegisteredMold, RegistryError};
pub use schema::{
    validate, validate_field, FieldSpec, FieldType, MoldInput, SchemaBuilder, SchemaDescriptor,
    SchemaError, SchemaValidationError,
};
pub use state::{ComposedState, ToolCall};
pub use tool_source::{
    MockToolSource, NoToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec,
};
