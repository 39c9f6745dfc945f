//! Topic channel: accumulates values into a list.
//!
//! Backs collection-typed fields and the reserved message log. Writes never replace earlier
//! elements; they are appended in write order.
//!
//! ```rust
//! use mold::channels::{Channel, Topic};
//!
//! let mut topic = Topic::with_values(vec!["rain".to_string()]);
//! topic.write("wind".to_string());
//! assert_eq!(topic.read(), Some(vec!["rain".to_string(), "wind".to_string()]));
//! ```

use std::fmt::Debug;

use super::Channel;

/// Accumulating list channel.
#[derive(Debug, Clone)]
pub struct Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    values: Vec<T>,
}

impl<T> Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty topic.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Creates a topic that already holds `values` (the prior state of the field).
    pub fn with_values(values: Vec<T>) -> Self {
        Self { values }
    }

    /// Appends every element of `values`.
    pub fn extend(&mut self, values: impl IntoIterator<Item = T>) {
        self.values.extend(values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the topic and returns the accumulated values.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

impl<T> Default for Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Channel<T> for Topic<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    type Output = Vec<T>;

    /// Returns all accumulated values, or `None` when nothing was ever written.
    fn read(&self) -> Option<Vec<T>> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.clone())
        }
    }

    fn write(&mut self, value: T) {
        self.values.push(value);
    }

    fn update(&mut self, updates: Vec<T>) {
        self.values.extend(updates);
    }

    fn channel_type(&self) -> &'static str {
        "Topic"
    }
}
