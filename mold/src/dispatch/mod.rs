//! Call dispatcher: classifies the calls of one reasoning step, validates mold inputs, runs
//! handlers and routes tool calls.
//!
//! Every call runs on its own tokio task, so a slow tool or handler does not hold up the others
//! and a panicking handler only fails its own call. Results come back in request order. Only a
//! handler's [`HandlerError::Fatal`] or cancellation fails the whole batch.

mod outcome;
mod request;

pub use outcome::{CallError, CallOutput, DispatchOutcome};
pub use request::{CallKind, CallRequest};

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::definition::HandlerError;
use crate::error::AgentError;
use crate::registry::{MoldRegistry, RegisteredMold, UpdateRejection};
use crate::schema::validate;
use crate::state::ToolCall;
use crate::tool_source::ToolSource;

use request::parse_arguments;

/// Routes calls to molds (registry first) or tools.
#[derive(Clone)]
pub struct CallDispatcher {
    registry: Arc<MoldRegistry>,
    tools: Arc<dyn ToolSource>,
    tool_names: Arc<HashSet<String>>,
    concurrent: bool,
}

impl CallDispatcher {
    pub fn new(
        registry: Arc<MoldRegistry>,
        tools: Arc<dyn ToolSource>,
        tool_names: HashSet<String>,
    ) -> Self {
        Self {
            registry,
            tools,
            tool_names: Arc::new(tool_names),
            concurrent: true,
        }
    }

    /// When false, calls still run on their own tasks but one after the other.
    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Classifies one model call: molds are resolved before tools.
    pub fn classify(&self, call: &ToolCall) -> CallRequest {
        let kind = if self.registry.contains(&call.name) {
            CallKind::Mold
        } else if self.tool_names.contains(&call.name) {
            CallKind::Tool
        } else {
            CallKind::Unknown
        };
        let call_id = call
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        CallRequest::new(kind, &call.name, parse_arguments(&call.arguments), call_id)
    }

    pub fn classify_all(&self, calls: &[ToolCall]) -> Vec<CallRequest> {
        calls.iter().map(|c| self.classify(c)).collect()
    }

    /// Dispatches a batch; one result per request, in request order.
    pub async fn dispatch(
        &self,
        requests: Vec<CallRequest>,
    ) -> Result<Vec<DispatchOutcome>, AgentError> {
        self.dispatch_cancellable(requests, &CancellationToken::new())
            .await
    }

    /// Like [`dispatch`](Self::dispatch); when `cancel` fires, in-flight calls are aborted and
    /// the whole batch is discarded with [`AgentError::Cancelled`].
    pub async fn dispatch_cancellable(
        &self,
        requests: Vec<CallRequest>,
        cancel: &CancellationToken,
    ) -> Result<Vec<DispatchOutcome>, AgentError> {
        debug!(calls = requests.len(), concurrent = self.concurrent, "dispatching batch");
        if self.concurrent {
            self.dispatch_concurrent(requests, cancel).await
        } else {
            self.dispatch_sequential(requests, cancel).await
        }
    }

    async fn dispatch_concurrent(
        &self,
        requests: Vec<CallRequest>,
        cancel: &CancellationToken,
    ) -> Result<Vec<DispatchOutcome>, AgentError> {
        let spawned: Vec<(CallRequest, JoinHandle<Result<DispatchOutcome, AgentError>>)> =
            requests
                .into_iter()
                .map(|request| {
                    let handle = self.spawn_one(request.clone());
                    (request, handle)
                })
                .collect();
        let aborts: Vec<_> = spawned.iter().map(|(_, h)| h.abort_handle()).collect();

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                for abort in &aborts {
                    abort.abort();
                }
                warn!(calls = aborts.len(), "dispatch cancelled, batch discarded");
                return Err(AgentError::Cancelled);
            }
            joined = join_all(spawned.into_iter().map(|(request, handle)| async move {
                (request, handle.await)
            })) => joined,
        };

        joined
            .into_iter()
            .map(|(request, result)| collect_joined(request, result))
            .collect()
    }

    async fn dispatch_sequential(
        &self,
        requests: Vec<CallRequest>,
        cancel: &CancellationToken,
    ) -> Result<Vec<DispatchOutcome>, AgentError> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let handle = self.spawn_one(request.clone());
            let abort = handle.abort_handle();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    abort.abort();
                    warn!("dispatch cancelled, batch discarded");
                    return Err(AgentError::Cancelled);
                }
                result = handle => result,
            };
            outcomes.push(collect_joined(request, result)?);
        }
        Ok(outcomes)
    }

    fn spawn_one(&self, request: CallRequest) -> JoinHandle<Result<DispatchOutcome, AgentError>> {
        let this = self.clone();
        tokio::spawn(async move { this.dispatch_one(request).await })
    }

    /// Runs one call. `Err` only for fatal handler failures.
    async fn dispatch_one(&self, request: CallRequest) -> Result<DispatchOutcome, AgentError> {
        let result = match request.kind {
            CallKind::Mold => match self.registry.get(&request.target_name) {
                Some(mold) => self.run_mold(mold, &request).await?,
                None => Err(CallError::UnknownTarget(request.target_name.clone())),
            },
            CallKind::Tool if self.tool_names.contains(&request.target_name) => {
                self.run_tool(&request).await
            }
            CallKind::Tool | CallKind::Unknown => {
                Err(CallError::UnknownTarget(request.target_name.clone()))
            }
        };
        if let Err(e) = &result {
            warn!(name = %request.target_name, call_id = %request.call_id, error = %e, "call failed");
        }
        Ok(DispatchOutcome { request, result })
    }

    async fn run_mold(
        &self,
        mold: &RegisteredMold,
        request: &CallRequest,
    ) -> Result<Result<CallOutput, CallError>, AgentError> {
        let name = mold.name();
        let input = match validate(mold.definition().schema(), &request.raw_arguments) {
            Ok(input) => input,
            Err(source) => {
                return Ok(Err(CallError::Validation {
                    mold: name.to_string(),
                    source,
                }))
            }
        };

        debug!(mold = %name, call_id = %request.call_id, "Calling mold");
        let handled = mold
            .definition()
            .handler()
            .handle(input, &request.call_id)
            .await;
        match handled {
            Ok(cmd) => match mold.to_state_updates(cmd) {
                Ok(cmd) => {
                    trace!(mold = %name, fields = cmd.state_updates.len(), "mold returned update");
                    Ok(Ok(CallOutput::Mold(cmd)))
                }
                Err(UpdateRejection::Undeclared(field)) => Ok(Err(CallError::Handler {
                    mold: name.to_string(),
                    message: format!("wrote undeclared field '{}'", field),
                })),
                Err(UpdateRejection::Invalid(source)) => Ok(Err(CallError::InvalidUpdate {
                    mold: name.to_string(),
                    source,
                })),
            },
            Err(HandlerError::Failed(message)) => Ok(Err(CallError::Handler {
                mold: name.to_string(),
                message,
            })),
            Err(HandlerError::Fatal(message)) => Err(AgentError::HandlerFatal {
                mold: name.to_string(),
                message,
            }),
        }
    }

    async fn run_tool(&self, request: &CallRequest) -> Result<CallOutput, CallError> {
        let args = if request.raw_arguments.is_object() {
            request.raw_arguments.clone()
        } else {
            warn!(tool = %request.target_name, "tool arguments are not an object, using {{}}");
            Value::Object(Default::default())
        };
        debug!(tool = %request.target_name, call_id = %request.call_id, args = ?args, "Calling tool");
        self.tools
            .call_tool(&request.target_name, args)
            .await
            .map(|content| CallOutput::Tool(content.text))
            .map_err(|e| CallError::Tool {
                tool: request.target_name.clone(),
                message: e.to_string(),
            })
    }
}

fn collect_joined(
    request: CallRequest,
    joined: Result<Result<DispatchOutcome, AgentError>, JoinError>,
) -> Result<DispatchOutcome, AgentError> {
    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => {
            warn!(name = %request.target_name, call_id = %request.call_id, "call panicked");
            let result = Err(CallError::Panicked(request.target_name.clone()));
            Ok(DispatchOutcome { request, result })
        }
        Err(_) => Err(AgentError::Cancelled),
    }
}
