//! The floating panel orchestrator.
//!
//! `FloatingPanel` composes one lifecycle, one content channel, a
//! reference to the layer store, and the dispatcher. All asynchronous
//! input -- widget confirmations and inbound content messages -- is
//! serialized through a single message pump task, which is the only
//! writer of the store and the lifecycle while the panel is live.

use crate::channel::{ContentChannel, ContentSurface};
use crate::dispatch::{Dispatcher, TabOpener};
use crate::lifecycle::{
    BackendFront, BackendRegistration, NoopBackend, PanelLifecycle, PanelState, WidgetEvent,
    WindowingHost,
};
use crate::protocol::WireMessage;
use crate::store::SharedStore;
use overlay_common::{EventBus, PanelEvent, PanelPosition, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// Configuration for one floating panel instance.
#[derive(Debug, Clone)]
pub struct PanelOptions {
    /// Title shown on the panel widget.
    pub title: String,
    /// URL of the content document rendered inside the panel.
    pub content_url: String,
    /// URL of the bootstrap script loaded into the content surface.
    pub bootstrap_script: String,
    /// URL opened on an `open-homepage` request.
    pub homepage_url: String,
    /// Host application version, stamped into every snapshot.
    pub version: String,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            title: "Layer Overlay".into(),
            content_url: "overlay://panel/index.html".into(),
            bootstrap_script: "overlay://panel/panel.js".into(),
            homepage_url: "https://github.com/dylan/overlay".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// A floating, host-privileged panel embedding an isolated content
/// surface.
///
/// `show`/`hide`/`toggle` must be called from within a tokio runtime;
/// the first `show` spawns the message pump task.
pub struct FloatingPanel {
    options: PanelOptions,
    windowing: Arc<dyn WindowingHost>,
    surface: Arc<dyn ContentSurface>,
    dispatcher: Arc<Dispatcher>,
    lifecycle: Arc<Mutex<PanelLifecycle>>,
    bus: Arc<EventBus>,
    backend: Arc<dyn BackendFront>,
    registration: Option<Box<dyn BackendRegistration>>,
    pump: Option<tokio::task::JoinHandle<()>>,
}

impl FloatingPanel {
    pub fn new(
        options: PanelOptions,
        windowing: Arc<dyn WindowingHost>,
        surface: Arc<dyn ContentSurface>,
        tabs: Arc<dyn TabOpener>,
        store: SharedStore,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            store,
            tabs,
            options.homepage_url.clone(),
            options.version.clone(),
        ));
        Self {
            options,
            windowing,
            surface,
            dispatcher,
            lifecycle: Arc::new(Mutex::new(PanelLifecycle::new())),
            bus: Arc::new(EventBus::new(16)),
            backend: Arc::new(NoopBackend),
            registration: None,
            pump: None,
        }
    }

    /// Replace the default no-op backend.
    pub fn with_backend(mut self, backend: Arc<dyn BackendFront>) -> Self {
        self.backend = backend;
        self
    }

    /// Hold a registration released by [`FloatingPanel::destroy`].
    pub fn with_registration(mut self, registration: Box<dyn BackendRegistration>) -> Self {
        self.registration = Some(registration);
        self
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.bus.subscribe()
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle.lock().unwrap().is_open()
    }

    pub fn state(&self) -> PanelState {
        self.lifecycle.lock().unwrap().state()
    }

    /// Position recorded at the last confirmed hide, if any.
    pub fn position(&self) -> Option<PanelPosition> {
        self.lifecycle.lock().unwrap().position()
    }

    /// Open the panel. No-op when already open. On the first call the
    /// widget and content surface are constructed; a construction
    /// failure propagates to the caller and the panel should be treated
    /// as unusable until `destroy()` plus a fresh instance.
    pub fn show(&mut self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if lifecycle.is_open() {
            debug!("show: panel already open");
            return Ok(());
        }

        if !lifecycle.has_widget() {
            let (widget, widget_events) = self.windowing.create_panel(&self.options.title)?;
            // The widget is adopted before the content surface attaches:
            // if wiring fails past this point the widget remains and a
            // later show() reuses it.
            lifecycle.install_widget(widget);
            let channel = self
                .surface
                .attach(&self.options.content_url, &self.options.bootstrap_script)?;
            info!(channel = %channel.id(), "content surface attached");
            self.pump = Some(self.spawn_pump(widget_events, channel));
        }

        lifecycle.open_at_remembered();
        Ok(())
    }

    /// Request the panel to hide. No-op when no widget exists. The
    /// `popuphidden` event fires once the host confirms and teardown
    /// completes.
    pub fn hide(&self) {
        self.lifecycle.lock().unwrap().request_hide();
    }

    /// Hide when open, show otherwise.
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_open() {
            self.hide();
            Ok(())
        } else {
            self.show()
        }
    }

    /// Release the held backend registration. Idempotent; safe in any
    /// state.
    pub fn destroy(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.unregister();
        }
    }

    fn spawn_pump(
        &self,
        mut widget_events: mpsc::UnboundedReceiver<WidgetEvent>,
        mut channel: ContentChannel,
    ) -> tokio::task::JoinHandle<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let lifecycle = Arc::clone(&self.lifecycle);
        let bus = Arc::clone(&self.bus);
        let backend = Arc::clone(&self.backend);
        let origin = self.options.content_url.clone();

        tokio::spawn(async move {
            let Some(mut inbound) = channel.take_inbound() else {
                warn!(channel = %channel.id(), "inbound stream already taken");
                return;
            };
            if let Some(ready) = channel.take_ready() {
                let id = channel.id().clone();
                tokio::spawn(async move {
                    if ready.await.is_ok() {
                        info!(channel = %id, "content surface ready");
                    } else {
                        debug!(channel = %id, "content surface dropped before ready");
                    }
                });
            }
            let mut widget_open = true;
            let mut inbound_open = true;

            loop {
                if !widget_open && !inbound_open {
                    break;
                }

                tokio::select! {
                    event = widget_events.recv(), if widget_open => match event {
                        Some(WidgetEvent::Shown) => {
                            lifecycle.lock().unwrap().confirm_shown();
                            info!("panel shown");
                            bus.publish(PanelEvent::PopupShown);
                        }
                        Some(WidgetEvent::Hidden { position }) => {
                            lifecycle.lock().unwrap().confirm_hidden(position);
                            if let Err(e) = backend.detach().await {
                                warn!("backend detach failed: {e}");
                            }
                            lifecycle.lock().unwrap().finish_detach();
                            info!(%position, "panel hidden");
                            bus.publish(PanelEvent::PopupHidden);
                        }
                        None => widget_open = false,
                    },
                    message = inbound.recv(), if inbound_open => match message {
                        Some(message) => {
                            debug!(kind = %message.kind, "inbound message");
                            match dispatcher.dispatch(&message) {
                                Ok(snapshot) => match snapshot.to_json() {
                                    Ok(data) => {
                                        channel.send(WireMessage::refresh(data, origin.clone()));
                                    }
                                    Err(e) => error!("failed to serialize snapshot: {e}"),
                                },
                                Err(e) => {
                                    error!(kind = %message.kind, "dispatch failed: {e}");
                                }
                            }
                        }
                        None => inbound_open = false,
                    },
                }
            }
            debug!(channel = %channel.id(), "message pump stopped");
        })
    }
}

impl Drop for FloatingPanel {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{channel, ContentEndpoint};
    use crate::protocol::{InboundMessage, MessageKind, Snapshot};
    use crate::store::{shared, MemoryLayerStore};
    use crate::lifecycle::PanelWidget;
    use overlay_common::OverlayError;
    use serde_json::json;

    /// Widget double that confirms every request through its event
    /// stream, the way a real toolkit would.
    struct EchoWidget {
        events: mpsc::UnboundedSender<WidgetEvent>,
        opened_at: Arc<Mutex<Vec<PanelPosition>>>,
        hidden_at: Arc<Mutex<PanelPosition>>,
    }

    impl PanelWidget for EchoWidget {
        fn open_at(&self, position: PanelPosition) {
            self.opened_at.lock().unwrap().push(position);
            let _ = self.events.send(WidgetEvent::Shown);
        }

        fn hide(&self) {
            let position = *self.hidden_at.lock().unwrap();
            let _ = self.events.send(WidgetEvent::Hidden { position });
        }
    }

    struct TestWindowing {
        opened_at: Arc<Mutex<Vec<PanelPosition>>>,
        hidden_at: Arc<Mutex<PanelPosition>>,
        created: Arc<Mutex<usize>>,
        fail: bool,
    }

    impl TestWindowing {
        fn new() -> Self {
            Self {
                opened_at: Arc::new(Mutex::new(Vec::new())),
                hidden_at: Arc::new(Mutex::new(PanelPosition::new(0, 0))),
                created: Arc::new(Mutex::new(0)),
                fail: false,
            }
        }
    }

    impl WindowingHost for TestWindowing {
        fn create_panel(
            &self,
            _title: &str,
        ) -> std::result::Result<
            (Box<dyn PanelWidget>, mpsc::UnboundedReceiver<WidgetEvent>),
            OverlayError,
        > {
            if self.fail {
                return Err(OverlayError::Windowing("no display".into()));
            }
            *self.created.lock().unwrap() += 1;
            let (tx, rx) = mpsc::unbounded_channel();
            let widget = EchoWidget {
                events: tx,
                opened_at: Arc::clone(&self.opened_at),
                hidden_at: Arc::clone(&self.hidden_at),
            };
            Ok((Box::new(widget), rx))
        }
    }

    /// Surface double: builds the channel pair and parks the content
    /// side for the test to drive.
    struct TestSurface {
        endpoint: Arc<Mutex<Option<ContentEndpoint>>>,
    }

    impl TestSurface {
        fn new() -> Self {
            Self {
                endpoint: Arc::new(Mutex::new(None)),
            }
        }

        fn take_endpoint(&self) -> ContentEndpoint {
            self.endpoint.lock().unwrap().take().unwrap()
        }
    }

    impl ContentSurface for TestSurface {
        fn attach(
            &self,
            _content_url: &str,
            _bootstrap_script: &str,
        ) -> std::result::Result<ContentChannel, OverlayError> {
            let (host, content) = channel();
            *self.endpoint.lock().unwrap() = Some(content);
            Ok(host)
        }
    }

    struct TestTabs {
        opened: Arc<Mutex<Vec<String>>>,
    }

    impl TabOpener for TestTabs {
        fn open_new_tab(&self, url: &str) {
            self.opened.lock().unwrap().push(url.to_string());
        }
    }

    struct Fixture {
        panel: FloatingPanel,
        windowing: Arc<TestWindowing>,
        surface: Arc<TestSurface>,
        tabs_opened: Arc<Mutex<Vec<String>>>,
        store: SharedStore,
    }

    fn fixture() -> Fixture {
        let windowing = Arc::new(TestWindowing::new());
        let surface = Arc::new(TestSurface::new());
        let tabs_opened = Arc::new(Mutex::new(Vec::new()));
        let tabs = Arc::new(TestTabs {
            opened: Arc::clone(&tabs_opened),
        });
        let store = shared(MemoryLayerStore::new());
        let panel = FloatingPanel::new(
            PanelOptions {
                version: "0.1.0".into(),
                ..Default::default()
            },
            windowing.clone(),
            surface.clone(),
            tabs,
            Arc::clone(&store),
        );
        Fixture {
            panel,
            windowing,
            surface,
            tabs_opened,
            store,
        }
    }

    #[tokio::test]
    async fn show_opens_at_default_placement() {
        let mut fx = fixture();
        let mut events = fx.panel.subscribe();

        fx.panel.show().unwrap();

        assert_eq!(events.recv().await.unwrap(), PanelEvent::PopupShown);
        assert!(fx.panel.is_open());
        assert_eq!(
            fx.windowing.opened_at.lock().unwrap()[0],
            PanelPosition::new(400, 400)
        );
    }

    #[tokio::test]
    async fn show_while_open_is_a_no_op() {
        let mut fx = fixture();
        let mut events = fx.panel.subscribe();

        fx.panel.show().unwrap();
        events.recv().await.unwrap();

        fx.panel.show().unwrap();

        assert_eq!(*fx.windowing.created.lock().unwrap(), 1);
        assert_eq!(fx.windowing.opened_at.lock().unwrap().len(), 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn hide_records_position_and_next_show_reuses_it() {
        let mut fx = fixture();
        let mut events = fx.panel.subscribe();
        *fx.windowing.hidden_at.lock().unwrap() = PanelPosition::new(120, 80);

        fx.panel.show().unwrap();
        events.recv().await.unwrap();

        fx.panel.hide();
        assert_eq!(events.recv().await.unwrap(), PanelEvent::PopupHidden);
        assert!(!fx.panel.is_open());
        assert_eq!(fx.panel.position(), Some(PanelPosition::new(120, 80)));

        fx.panel.show().unwrap();
        events.recv().await.unwrap();

        // Same widget, reopened at the recorded position.
        assert_eq!(*fx.windowing.created.lock().unwrap(), 1);
        assert_eq!(
            fx.windowing.opened_at.lock().unwrap().last().copied(),
            Some(PanelPosition::new(120, 80))
        );
    }

    #[tokio::test]
    async fn hide_while_closed_emits_nothing() {
        let fx = fixture();
        let mut events = fx.panel.subscribe();

        fx.panel.hide();

        assert_eq!(fx.panel.state(), PanelState::Closed);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn panel_ready_yields_the_first_snapshot() {
        let mut fx = fixture();
        fx.panel.show().unwrap();
        let mut endpoint = fx.surface.take_endpoint();

        endpoint.ready.send(()).unwrap();
        endpoint
            .to_host
            .send(InboundMessage::control(MessageKind::PanelReady))
            .unwrap();

        let refresh = endpoint.from_host.recv().await.unwrap();
        assert_eq!(refresh.kind, "refresh");
        assert_eq!(refresh.origin, "overlay://panel/index.html");
        let snapshot = Snapshot::from_json(&refresh.data).unwrap();
        assert_eq!(snapshot.version, "0.1.0");
        assert!(snapshot.layers.is_empty());
    }

    #[tokio::test]
    async fn add_round_trip_snapshots_the_new_layer() {
        let mut fx = fixture();
        fx.panel.show().unwrap();
        let mut endpoint = fx.surface.take_endpoint();
        endpoint.ready.send(()).unwrap();

        endpoint
            .to_host
            .send(InboundMessage::call(
                MessageKind::Add,
                vec![json!({"id": 1})],
            ))
            .unwrap();

        let refresh = endpoint.from_host.recv().await.unwrap();
        let snapshot = Snapshot::from_json(&refresh.data).unwrap();
        assert_eq!(snapshot.layers.len(), 1);
        assert_eq!(snapshot.layers[0].id(), Some(&json!(1)));
        assert_eq!(fx.store.lock().unwrap().layers().len(), 1);
    }

    #[tokio::test]
    async fn refreshes_follow_message_order() {
        let mut fx = fixture();
        fx.panel.show().unwrap();
        let mut endpoint = fx.surface.take_endpoint();
        endpoint.ready.send(()).unwrap();

        for id in 1..=3 {
            endpoint
                .to_host
                .send(InboundMessage::call(
                    MessageKind::Add,
                    vec![json!({"id": id})],
                ))
                .unwrap();
        }

        for expected_len in 1..=3usize {
            let refresh = endpoint.from_host.recv().await.unwrap();
            let snapshot = Snapshot::from_json(&refresh.data).unwrap();
            assert_eq!(snapshot.layers.len(), expected_len);
        }
    }

    #[tokio::test]
    async fn open_homepage_opens_a_tab_and_still_refreshes() {
        let mut fx = fixture();
        fx.panel.show().unwrap();
        let mut endpoint = fx.surface.take_endpoint();
        endpoint.ready.send(()).unwrap();

        endpoint
            .to_host
            .send(InboundMessage::control(MessageKind::OpenHomepage))
            .unwrap();

        let refresh = endpoint.from_host.recv().await.unwrap();
        assert_eq!(refresh.kind, "refresh");
        assert_eq!(
            fx.tabs_opened.lock().unwrap().as_slice(),
            ["https://github.com/dylan/overlay"]
        );
        assert!(fx.store.lock().unwrap().layers().is_empty());
    }

    #[tokio::test]
    async fn unknown_kind_still_yields_exactly_one_refresh() {
        let mut fx = fixture();
        fx.panel.show().unwrap();
        let mut endpoint = fx.surface.take_endpoint();
        endpoint.ready.send(()).unwrap();

        endpoint
            .to_host
            .send(InboundMessage::call(
                MessageKind::Other("reorder".into()),
                vec![json!(0), json!(1)],
            ))
            .unwrap();
        endpoint
            .to_host
            .send(InboundMessage::control(MessageKind::PanelReady))
            .unwrap();

        // One refresh per message, in order; the store is untouched.
        let first = endpoint.from_host.recv().await.unwrap();
        assert!(Snapshot::from_json(&first.data).unwrap().layers.is_empty());
        let second = endpoint.from_host.recv().await.unwrap();
        assert!(Snapshot::from_json(&second.data).unwrap().layers.is_empty());
        assert!(fx.store.lock().unwrap().layers().is_empty());
    }

    #[tokio::test]
    async fn failed_mutation_sends_no_refresh_but_panel_survives() {
        let mut fx = fixture();
        fx.panel.show().unwrap();
        let mut endpoint = fx.surface.take_endpoint();
        endpoint.ready.send(()).unwrap();

        // add with no args fails inside the store
        endpoint
            .to_host
            .send(InboundMessage::control(MessageKind::Add))
            .unwrap();
        endpoint
            .to_host
            .send(InboundMessage::call(
                MessageKind::Add,
                vec![json!({"id": 2})],
            ))
            .unwrap();

        // The only refresh that arrives belongs to the second message.
        let refresh = endpoint.from_host.recv().await.unwrap();
        let snapshot = Snapshot::from_json(&refresh.data).unwrap();
        assert_eq!(snapshot.layers.len(), 1);
        assert_eq!(snapshot.layers[0].id(), Some(&json!(2)));
    }

    #[tokio::test]
    async fn toggle_shows_then_hides() {
        let mut fx = fixture();
        let mut events = fx.panel.subscribe();

        fx.panel.toggle().unwrap();
        assert_eq!(events.recv().await.unwrap(), PanelEvent::PopupShown);

        fx.panel.toggle().unwrap();
        assert_eq!(events.recv().await.unwrap(), PanelEvent::PopupHidden);
    }

    #[tokio::test]
    async fn construction_failure_propagates_from_show() {
        let mut windowing = TestWindowing::new();
        windowing.fail = true;
        let surface = Arc::new(TestSurface::new());
        let tabs = Arc::new(TestTabs {
            opened: Arc::new(Mutex::new(Vec::new())),
        });
        let mut panel = FloatingPanel::new(
            PanelOptions::default(),
            Arc::new(windowing),
            surface,
            tabs,
            shared(MemoryLayerStore::new()),
        );

        let err = panel.show().unwrap_err();
        assert!(matches!(err, OverlayError::Windowing(_)));
        assert!(!panel.is_open());
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        struct CountingRegistration {
            count: Arc<Mutex<usize>>,
        }
        impl BackendRegistration for CountingRegistration {
            fn unregister(&self) {
                *self.count.lock().unwrap() += 1;
            }
        }

        let count = Arc::new(Mutex::new(0));
        let fx = fixture();
        let mut panel = fx.panel.with_registration(Box::new(CountingRegistration {
            count: Arc::clone(&count),
        }));

        panel.destroy();
        panel.destroy();

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
