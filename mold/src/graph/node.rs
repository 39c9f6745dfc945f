//! Graph node trait: one step in a graph run by the external runtime.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::Next;

/// One step in a graph: state in, (state out, next step).
///
/// **Interaction**: Implemented by [`ThinkNode`](crate::ThinkNode) and
/// [`DispatchNode`](crate::DispatchNode); the runtime calls `run` and follows the returned
/// `Next`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"think"`, `"dispatch"`). Must be unique within a graph.
    fn id(&self) -> &str;

    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;
}
