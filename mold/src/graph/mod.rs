//! Runtime contract for the external graph runner.
//!
//! The agent does not run its own reasoning loop; it exposes nodes ([`Node`]) that a graph
//! runtime invokes step by step, following the [`Next`] each node returns.

mod next;
mod node;

pub use next::Next;
pub use node::Node;
