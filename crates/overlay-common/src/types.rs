use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen coordinates the panel widget is anchored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelPosition {
    pub x: i32,
    pub y: i32,
}

/// Placement used when no position has been recorded yet.
pub const DEFAULT_PANEL_POSITION: PanelPosition = PanelPosition { x: 400, y: 400 };

impl PanelPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PanelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One entity the panel edits. The host treats it as an identifier plus
/// arbitrary attributes and never interprets the contents; only the
/// store implementation gives the attributes meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(serde_json::Value);

impl Layer {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The `id` attribute, if the layer carries one.
    pub fn id(&self) -> Option<&serde_json::Value> {
        self.0.get("id")
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut serde_json::Value {
        &mut self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Layer {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
