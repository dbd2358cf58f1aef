//! Message protocol between the host and the content surface.
//!
//! Messages flow in both directions:
//! - **content -> host**: the content surface posts an [`InboundMessage`]
//!   naming a kind and positional arguments.
//! - **host -> content**: the host answers every inbound message with a
//!   [`WireMessage`] of kind `refresh` whose `data` field carries a
//!   [`Snapshot`] serialized to JSON text.

use overlay_common::Layer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of inbound messages recognized by the host. Kinds the host does
/// not know are carried through verbatim so newer content surfaces keep
/// working against older hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// The content surface finished bootstrapping and wants its first snapshot.
    PanelReady,
    /// Append a layer to the store.
    Add,
    /// Drop a layer from the store.
    Remove,
    /// Patch attributes of an existing layer.
    Modify,
    /// Open the project homepage in a new browser tab.
    OpenHomepage,
    /// Any kind this host does not recognize.
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::PanelReady => "panel-ready",
            MessageKind::Add => "add",
            MessageKind::Remove => "remove",
            MessageKind::Modify => "modify",
            MessageKind::OpenHomepage => "open-homepage",
            MessageKind::Other(kind) => kind,
        }
    }
}

impl From<String> for MessageKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "panel-ready" => MessageKind::PanelReady,
            "add" => MessageKind::Add,
            "remove" => MessageKind::Remove,
            "modify" => MessageKind::Modify,
            "open-homepage" => MessageKind::OpenHomepage,
            _ => MessageKind::Other(s),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message from the content surface to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The message kind.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Positional arguments forwarded verbatim to the store.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<serde_json::Value>,
}

impl InboundMessage {
    /// Parse an inbound message from its raw JSON form.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Create a control message with no arguments.
    pub fn control(kind: MessageKind) -> Self {
        Self { kind, args: Vec::new() }
    }

    /// Create a message carrying positional arguments.
    pub fn call(kind: MessageKind, args: Vec<serde_json::Value>) -> Self {
        Self { kind, args }
    }
}

/// A message from the host to the content surface.
///
/// The field set mirrors a DOM-style event so the content side can feed
/// it straight into its own event plumbing; `data` is always serialized
/// to text before transmission because the content surface may live in a
/// different serialization domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// The message kind, `refresh` for snapshot broadcasts.
    #[serde(rename = "type")]
    pub kind: String,
    pub bubbles: bool,
    pub cancelable: bool,
    /// JSON text of the payload.
    pub data: String,
    /// URL of the content document this message targets.
    pub origin: String,
}

impl WireMessage {
    /// Build a `refresh` broadcast carrying pre-serialized snapshot text.
    pub fn refresh(data: String, origin: impl Into<String>) -> Self {
        Self {
            kind: "refresh".into(),
            bubbles: false,
            cancelable: false,
            data,
            origin: origin.into(),
        }
    }
}

/// Full state of the store, sent as the payload of every refresh. Always
/// the complete ordered layer sequence, never a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Host application version at time of send.
    pub version: String,
    pub layers: Vec<Layer>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
