//! Agent step error types.
//!
//! Returned by the step function ([`MoldAgent::step`](crate::MoldAgent::step)), the nodes and
//! the session. Per-call problems (unknown target, bad arguments, failing handler) never show
//! up here; they are reported to the model as error tool messages instead.

use thiserror::Error;

/// Agent step error.
///
/// Only conditions that must end the session reach the caller: a model failure, a handler that
/// declared its failure unrecoverable, or a cancelled batch.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A mold handler reported an unrecoverable condition.
    #[error("mold '{mold}' failed fatally: {message}")]
    HandlerFatal { mold: String, message: String },

    /// The step was cancelled; results of the batch were discarded.
    #[error("step cancelled")]
    Cancelled,
}
