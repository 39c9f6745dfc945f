//! Mock LLM for tests and examples.
//!
//! Returns scripted responses in order; once the script is exhausted it answers with plain text
//! and no tool calls, so an agent loop always terminates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::tool_source::ToolSpec;

const DEFAULT_FINAL_CONTENT: &str = "Done.";

/// Mock LLM with a fixed script of responses.
///
/// Records the messages and tool names of the last invocation so tests can assert on what the
/// agent sent.
pub struct MockLlm {
    script: Vec<LlmResponse>,
    final_content: String,
    call_count: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
    last_tool_names: Mutex<Vec<String>>,
}

impl MockLlm {
    /// Responses returned one per invocation, in order.
    pub fn scripted(script: Vec<LlmResponse>) -> Self {
        Self {
            script,
            final_content: DEFAULT_FINAL_CONTENT.to_string(),
            call_count: AtomicUsize::new(0),
            last_messages: Mutex::new(vec![]),
            last_tool_names: Mutex::new(vec![]),
        }
    }

    /// Assistant text and no tool calls (END path).
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::scripted(vec![]).with_final_content(content)
    }

    /// Text returned after the script is exhausted (builder).
    pub fn with_final_content(mut self, content: impl Into<String>) -> Self {
        self.final_content = content.into();
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Messages received by the last invocation.
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Tool and mold names received by the last invocation.
    pub fn last_tool_names(&self) -> Vec<String> {
        self.last_tool_names
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        if let Ok(mut names) = self.last_tool_names.lock() {
            *names = tools.iter().map(|t| t.name.clone()).collect();
        }
        let n = self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .script
            .get(n)
            .cloned()
            .unwrap_or_else(|| LlmResponse::new(self.final_content.clone(), vec![])))
    }
}
