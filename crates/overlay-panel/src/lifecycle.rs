//! Panel lifecycle state machine.
//!
//! Tracks panel existence and visibility, remembers the screen position
//! across hide/show cycles, and tears down attached backend resources
//! when the host confirms the panel is hidden.

use async_trait::async_trait;
use overlay_common::{OverlayError, PanelPosition, DEFAULT_PANEL_POSITION};
use tokio::sync::mpsc;
use tracing::debug;

/// Visibility states. `Creating` and `Detaching` bound the transition
/// edges while the host confirmation is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Creating,
    Open,
    Detaching,
}

/// Host confirmations for a panel widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The widget became visible.
    Shown,
    /// The widget was hidden; carries its screen position at hide time.
    Hidden { position: PanelPosition },
}

/// Windowing collaborator: constructs the native popup widget.
///
/// Construction either succeeds or fails synchronously; the failure
/// propagates to the caller of `show()` untouched.
pub trait WindowingHost: Send + Sync {
    fn create_panel(
        &self,
        title: &str,
    ) -> Result<(Box<dyn PanelWidget>, mpsc::UnboundedReceiver<WidgetEvent>), OverlayError>;
}

/// Handle to a native popup widget. Requests are fire-and-forget; the
/// host confirms through the [`WidgetEvent`] stream.
pub trait PanelWidget: Send + Sync {
    fn open_at(&self, position: PanelPosition);
    fn hide(&self);
}

/// Backend resource attached to an open panel, released on hide.
#[async_trait]
pub trait BackendFront: Send + Sync {
    /// May complete synchronously (nothing attached) or asynchronously
    /// (pending detach on the backend).
    async fn detach(&self) -> Result<(), OverlayError>;
}

/// Default backend: nothing attached, detach resolves immediately.
pub struct NoopBackend;

#[async_trait]
impl BackendFront for NoopBackend {
    async fn detach(&self) -> Result<(), OverlayError> {
        Ok(())
    }
}

/// Registration held against the surrounding host application, released
/// by `destroy()`.
pub trait BackendRegistration: Send {
    fn unregister(&self);
}

/// The lifecycle state machine.
///
/// Widget requests go out from here; confirmations come back through
/// the panel's message pump, which calls `confirm_shown` /
/// `confirm_hidden` / `finish_detach`.
pub struct PanelLifecycle {
    state: PanelState,
    position: Option<PanelPosition>,
    widget: Option<Box<dyn PanelWidget>>,
}

impl PanelLifecycle {
    pub fn new() -> Self {
        Self {
            state: PanelState::Closed,
            position: None,
            widget: None,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PanelState::Open
    }

    pub fn has_widget(&self) -> bool {
        self.widget.is_some()
    }

    /// Position recorded at the last confirmed hide, if any.
    pub fn position(&self) -> Option<PanelPosition> {
        self.position
    }

    /// Adopt a freshly constructed widget. The widget persists across
    /// hide/show cycles for the lifetime of this lifecycle.
    pub fn install_widget(&mut self, widget: Box<dyn PanelWidget>) {
        self.widget = Some(widget);
    }

    /// Request the widget to open at the remembered position, or the
    /// default placement if none was recorded yet.
    pub fn open_at_remembered(&mut self) {
        let Some(widget) = &self.widget else {
            debug!("open requested without a widget");
            return;
        };
        let position = self.position.unwrap_or(DEFAULT_PANEL_POSITION);
        self.state = PanelState::Creating;
        debug!(%position, "opening panel");
        widget.open_at(position);
    }

    /// Request the widget to hide. No-op without a widget or when the
    /// panel is already closed.
    pub fn request_hide(&mut self) {
        let Some(widget) = &self.widget else {
            return;
        };
        if self.state == PanelState::Closed {
            return;
        }
        self.state = PanelState::Detaching;
        widget.hide();
    }

    /// Host confirmed the widget is visible.
    pub fn confirm_shown(&mut self) {
        self.state = PanelState::Open;
    }

    /// Host confirmed the widget is hidden at `position`. Records the
    /// position; the state stays `Detaching` until teardown completes.
    ///
    /// A hide can also be host-initiated (user closed the panel), so
    /// this transition is accepted from any non-closed state.
    pub fn confirm_hidden(&mut self, position: PanelPosition) {
        self.position = Some(position);
        self.state = PanelState::Detaching;
    }

    /// Teardown finished; the panel is closed.
    pub fn finish_detach(&mut self) {
        self.state = PanelState::Closed;
    }
}

impl Default for PanelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
