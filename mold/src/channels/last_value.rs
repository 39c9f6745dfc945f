//! LastValue channel: keeps only the last written value.

use std::fmt::Debug;

use super::Channel;

/// LastValue channel: keeps only the last written value.
///
/// Backs scalar and record fields. When several calls in one batch write the same field, the
/// write of the latest call (in request order) wins.
///
/// ```rust
/// use mold::channels::{Channel, LastValue};
///
/// let mut channel = LastValue::new();
/// channel.write(72);
/// channel.write(75);
/// assert_eq!(channel.read(), Some(75));
/// ```
#[derive(Debug, Clone)]
pub struct LastValue<T> {
    value: Option<T>,
}

impl<T> LastValue<T> {
    /// Creates a new empty LastValue channel.
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Creates a new LastValue channel seeded with the prior value, if any.
    pub fn with_value(value: Option<T>) -> Self {
        Self { value }
    }
}

impl<T> Default for LastValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Channel<T> for LastValue<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    type Output = T;

    fn read(&self) -> Option<T> {
        self.value.clone()
    }

    fn write(&mut self, value: T) {
        self.value = Some(value);
    }

    fn update(&mut self, updates: Vec<T>) {
        if let Some(last) = updates.into_iter().last() {
            self.write(last);
        }
    }

    fn channel_type(&self) -> &'static str {
        "LastValue"
    }
}
