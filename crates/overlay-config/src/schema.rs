//! Configuration schema types for the overlay panel.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

// =============================================================================
// Panel Config
// =============================================================================

/// Panel widget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Title shown on the panel widget.
    pub title: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            title: "Layer Overlay".into(),
        }
    }
}

// =============================================================================
// Content Config
// =============================================================================

/// Content surface configuration: which document renders the panel UI
/// and which script bootstraps the message channel inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// URL of the content document rendered inside the panel.
    pub url: String,
    /// URL of the bootstrap script loaded into the content surface.
    pub bootstrap_script: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            url: "overlay://panel/index.html".into(),
            bootstrap_script: "overlay://panel/panel.js".into(),
        }
    }
}

// =============================================================================
// Links Config
// =============================================================================

/// External link targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// URL opened in a new browser tab on an `open-homepage` request.
    pub homepage: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            homepage: "https://github.com/dylan/overlay".into(),
        }
    }
}

// =============================================================================
// Logging Config
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing env-filter directive, e.g. `overlay=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "overlay=info".into(),
        }
    }
}

// =============================================================================
// Root Config
// =============================================================================

/// Root configuration for the overlay workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub panel: PanelConfig,
    pub content: ContentConfig,
    pub links: LinksConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = OverlayConfig::default();
        assert_eq!(config.panel.title, "Layer Overlay");
        assert_eq!(config.content.url, "overlay://panel/index.html");
        assert_eq!(config.content.bootstrap_script, "overlay://panel/panel.js");
        assert_eq!(config.links.homepage, "https://github.com/dylan/overlay");
        assert_eq!(config.logging.filter, "overlay=info");
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: OverlayConfig = toml::from_str(
            r#"
            [panel]
            title = "My Panel"
            "#,
        )
        .unwrap();
        assert_eq!(config.panel.title, "My Panel");
        assert_eq!(config.content.url, "overlay://panel/index.html");
        assert_eq!(config.logging.filter, "overlay=info");
    }

    #[test]
    fn empty_toml_is_default() {
        let config: OverlayConfig = toml::from_str("").unwrap();
        assert_eq!(config.panel.title, OverlayConfig::default().panel.title);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = OverlayConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: OverlayConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.panel.title, config.panel.title);
        assert_eq!(parsed.links.homepage, config.links.homepage);
    }
}
