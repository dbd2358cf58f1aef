use tokio::sync::broadcast;

/// Lifecycle notifications emitted by the panel. The set is fixed:
/// subscribers match on variants instead of registering by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// The host confirmed the panel widget is visible.
    PopupShown,
    /// The host confirmed the panel widget is hidden and teardown finished.
    PopupHidden,
}

pub struct EventBus {
    sender: broadcast::Sender<PanelEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: PanelEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
