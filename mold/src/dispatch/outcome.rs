//! Per-call dispatch results and the recoverable call errors reported to the model.

use serde_json::{json, Value};
use thiserror::Error;

use super::CallRequest;
use crate::definition::UpdateCommand;
use crate::schema::SchemaValidationError;

/// Successful result of one call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    /// Update produced by a mold handler, keyed by state field names.
    Mold(UpdateCommand),
    /// Text returned by an ordinary tool.
    Tool(String),
}

/// Recoverable per-call failure. Turned into an error tool message; never ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("unknown tool or mold '{0}'")]
    UnknownTarget(String),
    #[error("invalid arguments for mold '{mold}': {source}")]
    Validation {
        mold: String,
        #[source]
        source: SchemaValidationError,
    },
    #[error("mold '{mold}' failed: {message}")]
    Handler { mold: String, message: String },
    /// The handler wrote a value that does not fit the field's declared type.
    #[error("mold '{mold}' wrote an invalid update: {source}")]
    InvalidUpdate {
        mold: String,
        #[source]
        source: SchemaValidationError,
    },
    #[error("tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },
    #[error("call to '{0}' panicked")]
    Panicked(String),
}

impl CallError {
    /// Field the error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { source, .. } | Self::InvalidUpdate { source, .. } => {
                Some(source.field())
            }
            _ => None,
        }
    }

    /// Structured error payload `{error, field}` sent back to the model.
    pub fn payload(&self) -> Value {
        json!({
            "error": self.to_string(),
            "field": self.field(),
        })
    }
}

/// One request paired with its result.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub request: CallRequest,
    pub result: Result<CallOutput, CallError>,
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The update command when this was a successful mold call.
    pub fn update(&self) -> Option<&UpdateCommand> {
        match &self.result {
            Ok(CallOutput::Mold(cmd)) => Some(cmd),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CallError> {
        self.result.as_ref().err()
    }
}
