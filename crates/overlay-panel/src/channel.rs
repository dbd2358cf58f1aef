//! Transport between the host and the content surface.
//!
//! Both directions are unbounded in-order queues; delivery is
//! fire-and-forget. Once the content surface is torn down, sends degrade
//! to a silent drop -- the receiving end cannot observe the sender's
//! intent to retry, so no error surfaces.

use crate::protocol::{InboundMessage, WireMessage};
use overlay_common::{ChannelId, OverlayError};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Host-side endpoint of the content channel.
///
/// `send` may be called only after the content surface has signalled
/// readiness; the channel buffers nothing and does not check.
pub struct ContentChannel {
    id: ChannelId,
    outbound: mpsc::UnboundedSender<WireMessage>,
    inbound: Option<mpsc::UnboundedReceiver<InboundMessage>>,
    ready: Option<oneshot::Receiver<()>>,
}

impl ContentChannel {
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Transmit a message to the content surface, fire-and-forget.
    pub fn send(&self, message: WireMessage) {
        if self.outbound.send(message).is_err() {
            // Content surface is gone; tolerated by design.
            debug!(channel = %self.id, "dropping send, content surface detached");
        }
    }

    /// Take the inbound message stream. Messages arrive in order, each
    /// delivered at most once per channel instance.
    pub fn take_inbound(&mut self) -> Option<mpsc::UnboundedReceiver<InboundMessage>> {
        self.inbound.take()
    }

    /// Take the first-ready signal. Fires at most once per panel lifetime.
    pub fn take_ready(&mut self) -> Option<oneshot::Receiver<()>> {
        self.ready.take()
    }
}

/// Content-surface side of the channel pair, handed to the collaborator
/// that loads the content document.
pub struct ContentEndpoint {
    /// Messages from the host, in send order.
    pub from_host: mpsc::UnboundedReceiver<WireMessage>,
    /// Sender for messages to the host.
    pub to_host: mpsc::UnboundedSender<InboundMessage>,
    /// Signal that the content surface finished bootstrapping.
    pub ready: oneshot::Sender<()>,
}

/// Build a connected channel pair for one content surface instance.
pub fn channel() -> (ContentChannel, ContentEndpoint) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (ready_tx, ready_rx) = oneshot::channel();

    let host = ContentChannel {
        id: ChannelId::new(),
        outbound: outbound_tx,
        inbound: Some(inbound_rx),
        ready: Some(ready_rx),
    };
    let content = ContentEndpoint {
        from_host: outbound_rx,
        to_host: inbound_tx,
        ready: ready_tx,
    };
    (host, content)
}

/// Content-surface collaborator: loads a content document plus bootstrap
/// script into the panel widget and returns the live host endpoint.
pub trait ContentSurface: Send + Sync {
    fn attach(
        &self,
        content_url: &str,
        bootstrap_script: &str,
    ) -> Result<ContentChannel, OverlayError>;
}
