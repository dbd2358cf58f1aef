//! Inbound message routing.
//!
//! One inbound message maps to at most one store mutation or control
//! action, then the shared tail builds a full snapshot for the refresh
//! broadcast. Every handled message yields a snapshot, so a round trip
//! is self-healing: the content surface always receives ground truth
//! and never needs to diff.

use crate::protocol::{InboundMessage, MessageKind, Snapshot};
use crate::store::SharedStore;
use overlay_common::OverlayError;
use std::sync::Arc;
use tracing::debug;

/// External-tab collaborator: opens a URL in a new browser tab.
pub trait TabOpener: Send + Sync {
    fn open_new_tab(&self, url: &str);
}

/// Routes inbound messages to store mutations and builds the refresh
/// snapshot. Stateless apart from the injected collaborators; invoked
/// serially, one message at a time, which makes the store single-writer.
pub struct Dispatcher {
    store: SharedStore,
    tabs: Arc<dyn TabOpener>,
    homepage_url: String,
    version: String,
}

impl Dispatcher {
    pub fn new(
        store: SharedStore,
        tabs: Arc<dyn TabOpener>,
        homepage_url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tabs,
            homepage_url: homepage_url.into(),
            version: version.into(),
        }
    }

    /// Handle one inbound message and produce the refresh snapshot.
    ///
    /// A store mutation failure propagates and no snapshot is built for
    /// that message; the caller decides whether that is fatal.
    pub fn dispatch(&self, message: &InboundMessage) -> Result<Snapshot, OverlayError> {
        match &message.kind {
            MessageKind::PanelReady => {
                // The content surface wants its first snapshot.
            }
            MessageKind::Add => {
                self.store.lock().unwrap().add(&message.args)?;
            }
            MessageKind::Remove => {
                self.store.lock().unwrap().remove(&message.args)?;
            }
            MessageKind::Modify => {
                self.store.lock().unwrap().modify(&message.args)?;
            }
            MessageKind::OpenHomepage => {
                self.tabs.open_new_tab(&self.homepage_url);
            }
            MessageKind::Other(kind) => {
                debug!(kind = %kind, "ignoring unknown message kind");
            }
        }

        let layers = self.store.lock().unwrap().layers();
        Ok(Snapshot {
            version: self.version.clone(),
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{shared, MemoryLayerStore};
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingTabs {
        opened: Mutex<Vec<String>>,
    }

    impl RecordingTabs {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                opened: Mutex::new(Vec::new()),
            })
        }
    }

    impl TabOpener for RecordingTabs {
        fn open_new_tab(&self, url: &str) {
            self.opened.lock().unwrap().push(url.to_string());
        }
    }

    fn dispatcher() -> (Dispatcher, SharedStore, Arc<RecordingTabs>) {
        let store = shared(MemoryLayerStore::new());
        let tabs = RecordingTabs::new();
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            tabs.clone(),
            "https://example.com/home",
            "0.1.0",
        );
        (dispatcher, store, tabs)
    }

    #[test]
    fn add_mutates_store_and_snapshots() {
        let (dispatcher, store, _) = dispatcher();

        let snapshot = dispatcher
            .dispatch(&InboundMessage::call(
                MessageKind::Add,
                vec![json!({"id": 1})],
            ))
            .unwrap();

        assert_eq!(snapshot.version, "0.1.0");
        assert_eq!(snapshot.layers.len(), 1);
        assert_eq!(snapshot.layers[0].id(), Some(&json!(1)));
        assert_eq!(store.lock().unwrap().layers().len(), 1);
    }

    #[test]
    fn panel_ready_snapshots_without_mutation() {
        let (dispatcher, store, _) = dispatcher();
        store.lock().unwrap().add(&[json!({"id": 1})]).unwrap();

        let snapshot = dispatcher
            .dispatch(&InboundMessage::control(MessageKind::PanelReady))
            .unwrap();

        assert_eq!(snapshot.layers.len(), 1);
    }

    #[test]
    fn open_homepage_hits_the_tab_opener_and_still_snapshots() {
        let (dispatcher, store, tabs) = dispatcher();

        let snapshot = dispatcher
            .dispatch(&InboundMessage::control(MessageKind::OpenHomepage))
            .unwrap();

        assert_eq!(
            tabs.opened.lock().unwrap().as_slice(),
            ["https://example.com/home"]
        );
        assert!(snapshot.layers.is_empty());
        assert!(store.lock().unwrap().layers().is_empty());
    }

    #[test]
    fn unknown_kind_is_a_pure_snapshot() {
        let (dispatcher, store, tabs) = dispatcher();
        store.lock().unwrap().add(&[json!({"id": 1})]).unwrap();

        let snapshot = dispatcher
            .dispatch(&InboundMessage::call(
                MessageKind::Other("reorder".into()),
                vec![json!(1), json!(0)],
            ))
            .unwrap();

        assert_eq!(snapshot.layers.len(), 1);
        assert!(tabs.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn mutation_failure_propagates_without_a_snapshot() {
        let (dispatcher, store, _) = dispatcher();

        let err = dispatcher
            .dispatch(&InboundMessage::control(MessageKind::Add))
            .unwrap_err();

        assert!(matches!(err, OverlayError::Store(_)));
        assert!(store.lock().unwrap().layers().is_empty());
    }

    #[test]
    fn snapshot_is_always_the_full_sequence() {
        let (dispatcher, _, _) = dispatcher();

        for id in 1..=3 {
            let snapshot = dispatcher
                .dispatch(&InboundMessage::call(
                    MessageKind::Add,
                    vec![json!({"id": id})],
                ))
                .unwrap();
            assert_eq!(snapshot.layers.len(), id as usize);
        }

        let snapshot = dispatcher
            .dispatch(&InboundMessage::call(MessageKind::Remove, vec![json!(2)]))
            .unwrap();
        let ids: Vec<_> = snapshot.layers.iter().map(|l| l.id().cloned()).collect();
        assert_eq!(ids, vec![Some(json!(1)), Some(json!(3))]);
    }
}
