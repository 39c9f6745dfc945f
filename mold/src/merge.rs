//! State merger: applies one dispatch batch to a session state.
//!
//! Pure function of `(state, outcomes)`. Successful mold updates are applied in request order
//! through the channel fixed for each field at composition time ([`LastValue`] or [`Topic`]);
//! every outcome contributes its messages to the log, failed calls as error tool messages.

use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::channels::{Channel, LastValue, Topic};
use crate::compose::{MergePolicy, StateShape};
use crate::dispatch::{CallOutput, DispatchOutcome};
use crate::message::Message;
use crate::state::ComposedState;

/// Applies dispatch outcomes to a [`ComposedState`] under the per-field merge policy.
#[derive(Debug, Clone)]
pub struct StateMerger {
    shape: Arc<StateShape>,
}

impl StateMerger {
    pub fn new(shape: Arc<StateShape>) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &StateShape {
        &self.shape
    }

    /// Returns the state after applying `outcomes`; `state` itself is not modified.
    pub fn merge(&self, state: &ComposedState, outcomes: &[DispatchOutcome]) -> ComposedState {
        let mut next = state.clone();

        for field in self.shape.fields() {
            let writes: Vec<Value> = outcomes
                .iter()
                .filter_map(|o| o.update())
                .filter_map(|cmd| cmd.state_updates.get(&field.name).cloned())
                .collect();
            if writes.is_empty() {
                continue;
            }
            trace!(field = %field.name, writes = writes.len(), merge = ?field.merge, "merging field");
            let merged = match field.merge {
                MergePolicy::LastValue => {
                    let mut channel = LastValue::with_value(state.get(&field.name).cloned());
                    channel.update(writes);
                    channel.read()
                }
                MergePolicy::Append => {
                    let prior = match state.get(&field.name) {
                        Some(Value::Array(items)) => items.clone(),
                        Some(other) => vec![other.clone()],
                        None => vec![],
                    };
                    let mut channel = Topic::with_values(prior);
                    for write in writes {
                        match write {
                            Value::Array(items) => channel.extend(items),
                            other => channel.write(other),
                        }
                    }
                    Some(Value::Array(channel.into_values()))
                }
            };
            if let Some(value) = merged {
                next.set(field.name.clone(), value);
            }
        }

        for cmd in outcomes.iter().filter_map(|o| o.update()) {
            for key in cmd.state_updates.keys() {
                if self.shape.field(key).is_none() {
                    warn!(field = %key, "update for a field outside the state shape ignored");
                }
            }
        }

        let mut log = Topic::with_values(std::mem::take(&mut next.messages));
        for outcome in outcomes {
            log.extend(outcome_messages(outcome));
        }
        next.messages = log.into_values();
        next
    }
}

/// Messages one outcome contributes to the log.
///
/// A mold that appends no messages of its own still answers its call with the serialized
/// field values it wrote.
fn outcome_messages(outcome: &DispatchOutcome) -> Vec<Message> {
    let request = &outcome.request;
    match &outcome.result {
        Ok(CallOutput::Mold(cmd)) if cmd.messages_to_append.is_empty() => vec![Message::tool(
            &request.call_id,
            &request.target_name,
            Value::Object(cmd.state_updates.clone()).to_string(),
        )],
        Ok(CallOutput::Mold(cmd)) => cmd.messages_to_append.clone(),
        Ok(CallOutput::Tool(text)) => vec![Message::tool(
            &request.call_id,
            &request.target_name,
            text.clone(),
        )],
        Err(e) => vec![Message::tool_error(
            &request.call_id,
            &request.target_name,
            e.payload().to_string(),
        )],
    }
}
