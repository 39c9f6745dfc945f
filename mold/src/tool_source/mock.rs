//! Mock tool source for tests and examples.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolCallContent, ToolSource, ToolSourceError, ToolSpec};

/// Mock tool source: fixed tool list and fixed results.
///
/// Every call returns `call_result` unless a per-name result or failure was configured.
/// An optional delay simulates a slow external tool.
pub struct MockToolSource {
    tools: Vec<ToolSpec>,
    call_result: String,
    per_tool: HashMap<String, Result<String, String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockToolSource {
    pub fn new(tools: Vec<ToolSpec>, call_result: String) -> Self {
        Self {
            tools,
            call_result,
            per_tool: HashMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// One tool `get_time` returning a fixed timestamp.
    pub fn get_time_example() -> Self {
        Self::new(
            vec![ToolSpec {
                name: "get_time".to_string(),
                description: Some("Get current time.".to_string()),
                input_schema: serde_json::json!({ "type": "object", "properties": {} }),
            }],
            "2025-01-29 12:00:00".to_string(),
        )
    }

    pub fn with_call_result(mut self, result: String) -> Self {
        self.call_result = result;
        self
    }

    /// Result text for calls to `name`.
    pub fn with_result_for(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.per_tool.insert(name.into(), Ok(text.into()));
        self
    }

    /// Calls to `name` fail with a transport error.
    pub fn with_failure_for(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.per_tool.insert(name.into(), Err(message.into()));
        self
    }

    /// Every call sleeps for `delay` before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `call_tool` invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.per_tool.get(name) {
            Some(Ok(text)) => Ok(ToolCallContent { text: text.clone() }),
            Some(Err(message)) => Err(ToolSourceError::Transport(message.clone())),
            None => Ok(ToolCallContent {
                text: self.call_result.clone(),
            }),
        }
    }
}
