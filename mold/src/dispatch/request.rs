//! Call requests: one classified call from the model's reasoning step.

use serde_json::Value;
use tracing::warn;

/// Where a call is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Mold,
    Tool,
    /// Neither a registered mold nor a known tool.
    Unknown,
}

/// One call issued by the model, classified and with parsed arguments. Never re-dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub kind: CallKind,
    pub target_name: String,
    pub raw_arguments: Value,
    pub call_id: String,
}

impl CallRequest {
    pub fn new(
        kind: CallKind,
        target_name: impl Into<String>,
        raw_arguments: Value,
        call_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target_name: target_name.into(),
            raw_arguments,
            call_id: call_id.into(),
        }
    }
}

/// Parses the model's argument string.
///
/// Empty input is `{}`; a JSON string holding JSON is decoded once more. Unparseable input is
/// kept as a JSON string so schema validation reports it.
pub(crate) fn parse_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return serde_json::json!({});
    }
    let raw: Value = match serde_json::from_str(arguments) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, arguments = %arguments, "call arguments are not valid JSON");
            return Value::String(arguments.to_string());
        }
    };
    match raw.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(raw),
        None => raw,
    }
}
