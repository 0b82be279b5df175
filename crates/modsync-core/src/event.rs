//! Configuration change events.
//!
//! Events arrive from a subscription on the shared store's config
//! topics. The wire operation is a free-form string; anything other
//! than the two known operations maps to [`ChangeOp::Other`], which
//! consumers must ignore rather than treat as an error.

use std::fmt;

/// Operation carried by a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOp {
    /// Entry was created or updated in the config.
    Set,

    /// Entry was removed from the config.
    Delete,

    /// Unrecognized operation; must be ignored, never escalated.
    Other,
}

impl ChangeOp {
    /// Parses the store's wire operation string.
    pub fn from_wire(op: &str) -> Self {
        match op {
            "SET" => Self::Set,
            "DEL" => Self::Delete,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set => write!(f, "SET"),
            Self::Delete => write!(f, "DEL"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// One discrete change notification from a config subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Config key the change applies to (a unit name for module config).
    pub key: String,

    /// What happened to the key.
    pub op: ChangeOp,

    /// Field values accompanying the change, in wire order.
    pub fields: Vec<(String, String)>,
}

impl ChangeEvent {
    /// Creates an event with no accompanying fields.
    pub fn new(key: impl Into<String>, op: ChangeOp) -> Self {
        Self {
            key: key.into(),
            op,
            fields: Vec::new(),
        }
    }
}
