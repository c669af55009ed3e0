//! Named events that label transition triggers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Immutable named token used to trigger transitions.
///
/// Identity is the name: two events with equal names are interchangeable
/// wherever a machine looks an event up.
///
/// # Example
///
/// ```rust
/// use hfsm::core::Event;
///
/// let go = Event::new("go");
/// assert_eq!(go, Event::new("go"));
/// assert_eq!(go.to_string(), "Event=go");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    name: Arc<str>,
}

impl Event {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event={}", self.name)
    }
}
