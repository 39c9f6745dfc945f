//! Channels: per-field update strategies used by the state merger.
//!
//! Each state field is backed by one channel during a merge; the channel kind is fixed by the
//! field's [`MergePolicy`](crate::MergePolicy) when the state shape is composed:
//!
//! - `LastValue`: keeps only the last written value (scalars and records)
//! - `Topic`: accumulates values into a list (collections and the message log)

mod last_value;
mod topic;

pub use last_value::LastValue;
pub use topic::Topic;

use std::fmt::Debug;

/// Channel trait for state management with different update strategies.
///
/// A channel decides what happens when several calls of one batch write the same field.
pub trait Channel<T>: Send + Sync + Debug
where
    T: Clone + Send + Sync + Debug + 'static,
{
    /// The value type produced by [`read`](Channel::read).
    type Output;

    /// Read the current value from the channel.
    ///
    /// Returns `None` if the channel has no value.
    fn read(&self) -> Option<Self::Output>;

    /// Write a new value to the channel.
    fn write(&mut self, value: T);

    /// Update the channel with multiple values, in order.
    fn update(&mut self, updates: Vec<T>);

    /// Get the channel type name for debugging and introspection.
    fn channel_type(&self) -> &'static str;
}
