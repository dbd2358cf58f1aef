//! Floating overlay panel hosting an isolated content surface.
//!
//! The host side owns the panel lifecycle, the layer store seam, and
//! the message protocol; the content surface is reachable only through
//! asynchronous message passing:
//! - **content -> host**: mutation and control messages routed by the
//!   dispatcher to store operations
//! - **host -> content**: full-snapshot `refresh` broadcasts after every
//!   handled message
//!
//! The windowing toolkit, the content loading mechanism, and the layer
//! editing semantics live behind the [`WindowingHost`], [`ContentSurface`],
//! and [`LayerStore`] seams supplied by the surrounding application.

pub mod channel;
pub mod dispatch;
pub mod lifecycle;
pub mod panel;
pub mod protocol;
pub mod store;

pub use channel::{channel, ContentChannel, ContentEndpoint, ContentSurface};
pub use dispatch::{Dispatcher, TabOpener};
pub use lifecycle::{
    BackendFront, BackendRegistration, NoopBackend, PanelLifecycle, PanelState, PanelWidget,
    WidgetEvent, WindowingHost,
};
pub use panel::{FloatingPanel, PanelOptions};
pub use protocol::{InboundMessage, MessageKind, Snapshot, WireMessage};
pub use store::{shared, LayerStore, MemoryLayerStore, SharedStore};
