//! Composed conversation state and the tool-call record produced by the model.
//!
//! A [`ComposedState`] is created fresh per session and replaced by the state merger after
//! every dispatch batch. It serializes as a plain JSON record: `messages` plus one key per
//! composed field that currently holds a value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::Message;

/// A single call produced by the model in one reasoning step.
///
/// `arguments` is the raw JSON string emitted by the model; `id` correlates the call with its
/// tool message. Calls without an id get one assigned before dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool or mold name.
    pub name: String,
    /// Arguments as JSON string.
    pub arguments: String,
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
            id: Some(id.into()),
        }
    }
}

/// Shared state of one conversation: the append-only message log plus mold field values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposedState {
    pub messages: Vec<Message>,
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl ComposedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            values: Map::new(),
        }
    }

    /// Current value of a field; `None` while no mold has written it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Sets a field value (builder), e.g. to seed a session.
    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    /// All field values that are currently set.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Tool calls of the last message when it is an assistant turn that issued calls.
    pub fn pending_tool_calls(&self) -> Option<&[ToolCall]> {
        match self.messages.last() {
            Some(Message::Assistant { tool_calls, .. }) if !tool_calls.is_empty() => {
                Some(tool_calls)
            }
            _ => None,
        }
    }

    /// Content of the chronologically last assistant message, if any.
    pub fn last_assistant_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    /// The state as a JSON record.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: State serializes as one flat record and deserializes back.
    #[test]
    fn state_is_a_flat_json_record() {
        let state = ComposedState::with_messages(vec![Message::user("hi")])
            .with_value("city", json!("Seattle"));
        let v = state.to_json();
        assert_eq!(v["city"], "Seattle");
        assert_eq!(v["messages"][0]["role"], "user");
        let back: ComposedState = serde_json::from_value(v).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn pending_tool_calls_only_for_trailing_assistant_with_calls() {
        let mut state = ComposedState::with_messages(vec![Message::user("hi")]);
        assert!(state.pending_tool_calls().is_none());
        state.push_message(Message::assistant_with_calls(
            "",
            vec![ToolCall::new("weather_report", "{}", "c1")],
        ));
        assert_eq!(state.pending_tool_calls().unwrap().len(), 1);
        state.push_message(Message::tool("c1", "weather_report", "{}"));
        assert!(state.pending_tool_calls().is_none());
        assert_eq!(state.last_assistant_reply(), Some(""));
    }
}
