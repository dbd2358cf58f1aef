pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, OverlayError, StoreError};
pub use events::{EventBus, PanelEvent};
pub use id::{new_id, ChannelId};
pub use types::{Layer, PanelPosition, DEFAULT_PANEL_POSITION};

pub type Result<T> = std::result::Result<T, OverlayError>;
