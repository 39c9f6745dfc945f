//! Next-step result from a graph node: continue linear chain, jump to a node, or end.

/// Next step after running a node.
///
/// - **Continue**: follow the linear edge order (next node in chain, or END if last).
/// - **Node(id)**: jump to the given node (e.g. dispatch → think).
/// - **End**: stop; return current state as final result.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    Continue,
    Node(String),
    End,
}
