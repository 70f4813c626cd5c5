//! The raw property-change notification shape.

use serde::{Deserialize, Serialize};

/// One property-change notification as delivered by the transport.
///
/// Mirrors the three-part shape of the underlying signal: the interface the
/// change is scoped to, a map of properties with fresh values inline, and a
/// list of properties that changed without a value and must be re-read on
/// demand if anyone still cares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyUpdate {
    /// Interface scope tag
    pub interface: String,

    /// Properties that changed, with their new values inline
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub changed: serde_json::Map<String, serde_json::Value>,

    /// Properties that changed without an inline value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalidated: Vec<String>,
}

impl PropertyUpdate {
    /// An empty notification scoped to `interface`.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            changed: serde_json::Map::new(),
            invalidated: Vec::new(),
        }
    }

    /// Attach an inline value for `property`.
    pub fn with_changed(mut self, property: impl Into<String>, value: serde_json::Value) -> Self {
        self.changed.insert(property.into(), value);
        self
    }

    /// Mark `property` as changed without an inline value.
    pub fn with_invalidated(mut self, property: impl Into<String>) -> Self {
        self.invalidated.push(property.into());
        self
    }
}
