//! In-process stand-ins for the out-of-scope collaborators.
//!
//! The real windowing toolkit and content document live outside this
//! workspace. The demo binary drives the panel with simulated versions:
//! a widget that confirms requests the way a host toolkit would, and a
//! content surface that replays the short layer-editing session the
//! bundled panel script would perform.

use overlay_common::{OverlayError, PanelPosition};
use overlay_panel::{
    channel, ContentChannel, ContentEndpoint, ContentSurface, InboundMessage, MessageKind,
    PanelWidget, Snapshot, TabOpener, WidgetEvent, WindowingHost,
};
use serde_json::json;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Windowing collaborator: hands out widgets that echo every request
/// back as a confirmation event.
pub struct SimWindowing;

struct SimWidget {
    events: mpsc::UnboundedSender<WidgetEvent>,
    position: Mutex<PanelPosition>,
}

impl PanelWidget for SimWidget {
    fn open_at(&self, position: PanelPosition) {
        info!(%position, "host: panel opened");
        *self.position.lock().unwrap() = position;
        let _ = self.events.send(WidgetEvent::Shown);
    }

    fn hide(&self) {
        let position = *self.position.lock().unwrap();
        info!(%position, "host: panel hidden");
        let _ = self.events.send(WidgetEvent::Hidden { position });
    }
}

impl WindowingHost for SimWindowing {
    fn create_panel(
        &self,
        title: &str,
    ) -> Result<(Box<dyn PanelWidget>, mpsc::UnboundedReceiver<WidgetEvent>), OverlayError> {
        info!(title, "host: creating panel widget");
        let (tx, rx) = mpsc::unbounded_channel();
        let widget = SimWidget {
            events: tx,
            position: Mutex::new(PanelPosition::new(0, 0)),
        };
        Ok((Box::new(widget), rx))
    }
}

/// Content-surface collaborator: each attach spawns a scripted session
/// and reports completion on the `done` channel.
pub struct SimSurface {
    done: mpsc::UnboundedSender<()>,
}

impl SimSurface {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (done, done_rx) = mpsc::unbounded_channel();
        (Self { done }, done_rx)
    }
}

impl ContentSurface for SimSurface {
    fn attach(
        &self,
        content_url: &str,
        bootstrap_script: &str,
    ) -> Result<ContentChannel, OverlayError> {
        info!(content_url, bootstrap_script, "content: loading document");
        let (host, endpoint) = channel();
        tokio::spawn(run_content_session(endpoint, self.done.clone()));
        Ok(host)
    }
}

/// The session the bundled panel script would run: bootstrap, request
/// the first snapshot, edit some layers, follow the homepage link.
async fn run_content_session(mut endpoint: ContentEndpoint, done: mpsc::UnboundedSender<()>) {
    if endpoint.ready.send(()).is_err() {
        warn!("content: host went away before bootstrap");
        return;
    }

    let script = [
        InboundMessage::control(MessageKind::PanelReady),
        InboundMessage::call(
            MessageKind::Add,
            vec![json!({"id": 1, "url": "layers/header.png", "opacity": 1.0})],
        ),
        InboundMessage::call(
            MessageKind::Add,
            vec![json!({"id": 2, "url": "layers/footer.png", "opacity": 1.0})],
        ),
        InboundMessage::call(MessageKind::Modify, vec![json!(1), json!({"opacity": 0.6})]),
        InboundMessage::call(MessageKind::Remove, vec![json!(2)]),
        InboundMessage::control(MessageKind::OpenHomepage),
    ];

    for message in script {
        let kind = message.kind.clone();
        if endpoint.to_host.send(message).is_err() {
            warn!("content: channel closed mid-session");
            return;
        }
        match endpoint.from_host.recv().await {
            Some(refresh) => match Snapshot::from_json(&refresh.data) {
                Ok(snapshot) => info!(
                    request = %kind,
                    version = %snapshot.version,
                    layers = snapshot.layers.len(),
                    "content: refresh received"
                ),
                Err(e) => warn!("content: malformed refresh: {e}"),
            },
            None => {
                warn!("content: host closed the channel");
                return;
            }
        }
    }

    let _ = done.send(());
}

/// External-tab collaborator: logs instead of spawning a browser.
pub struct SimTabs;

impl TabOpener for SimTabs {
    fn open_new_tab(&self, url: &str) {
        info!(url, "host: opening new browser tab");
    }
}
