//! Assembles a [`MoldAgent`]: registry, composed shape, dispatcher and merger.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::compose::StateComposer;
use crate::definition::MoldDefinition;
use crate::dispatch::CallDispatcher;
use crate::llm::LlmClient;
use crate::merge::StateMerger;
use crate::registry::MoldRegistry;
use crate::tool_source::{NoToolSource, ToolSource};

use super::config::MoldAgentConfig;
use super::error::BuildAgentError;
use super::MoldAgent;

/// Builder for [`MoldAgent`].
///
/// Molds register in the order they are added; that order decides field ownership and the
/// order of mold specs shown to the model.
pub struct AgentBuilder {
    model: Arc<dyn LlmClient>,
    tools: Option<Arc<dyn ToolSource>>,
    molds: Vec<MoldDefinition>,
    prompt: String,
    config: MoldAgentConfig,
}

impl AgentBuilder {
    pub fn new(model: Arc<dyn LlmClient>) -> Self {
        Self {
            model,
            tools: None,
            molds: Vec::new(),
            prompt: String::new(),
            config: MoldAgentConfig::default(),
        }
    }

    pub fn tools(mut self, tools: Arc<dyn ToolSource>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn mold(mut self, mold: MoldDefinition) -> Self {
        self.molds.push(mold);
        self
    }

    pub fn molds(mut self, molds: impl IntoIterator<Item = MoldDefinition>) -> Self {
        self.molds.extend(molds);
        self
    }

    /// System prompt injected before the first reasoning step.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn config(mut self, config: MoldAgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers molds, composes the state shape and lists the tool source.
    ///
    /// Fails on the first registration error; no partially built agent is returned.
    pub async fn build(self) -> Result<MoldAgent, BuildAgentError> {
        let mut registry = MoldRegistry::new(self.config.field_conflict_policy);
        for mold in self.molds {
            registry.register(mold)?;
        }
        let shape = StateComposer::compose(&registry)?;

        let tools: Arc<dyn ToolSource> = self.tools.unwrap_or_else(|| Arc::new(NoToolSource));
        let tool_specs = tools.list_tools().await?;
        let tool_names: HashSet<String> = tool_specs.iter().map(|t| t.name.clone()).collect();
        for name in tool_names.iter().filter(|n| registry.contains(n)) {
            warn!(name = %name, "mold shadows a tool with the same name; calls go to the mold");
        }

        if self.config.debug {
            info!(shape = %shape.to_json(), "composed state shape");
        }
        debug!(
            molds = registry.len(),
            tools = tool_names.len(),
            fields = shape.fields().len(),
            "mold agent built"
        );

        let registry = Arc::new(registry);
        let shape = Arc::new(shape);
        let dispatcher = CallDispatcher::new(registry.clone(), tools, tool_names)
            .with_concurrency(self.config.concurrent_dispatch);
        let merger = StateMerger::new(shape.clone());

        Ok(MoldAgent {
            model: self.model,
            registry,
            shape,
            tool_specs,
            dispatcher,
            merger,
            prompt: self.prompt,
            config: self.config,
        })
    }
}

/// Builds a [`MoldAgent`] from a model, optional tools, molds and a system prompt.
///
/// `config` is the mapping form of [`MoldAgentConfig`], e.g.
/// `{"field_conflict_policy": "namespace"}`; missing keys and `None` keep the defaults (error on
/// field conflicts, concurrent dispatch, no debug output). Use [`AgentBuilder::config`] to pass
/// an already built config.
pub async fn create_mold_agent(
    model: Arc<dyn LlmClient>,
    tools: Option<Arc<dyn ToolSource>>,
    molds: Vec<MoldDefinition>,
    prompt: impl Into<String>,
    config: Option<Value>,
) -> Result<MoldAgent, BuildAgentError> {
    let config = match config {
        Some(mapping) => MoldAgentConfig::from_value(mapping)?,
        None => MoldAgentConfig::default(),
    };
    let mut builder = AgentBuilder::new(model)
        .molds(molds)
        .prompt(prompt)
        .config(config);
    if let Some(tools) = tools {
        builder = builder.tools(tools);
    }
    builder.build().await
}
