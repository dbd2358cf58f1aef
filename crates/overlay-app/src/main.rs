mod cli;
mod sim;

use std::path::Path;
use std::sync::Arc;

use overlay_common::PanelEvent;
use overlay_config::OverlayConfig;
use overlay_panel::{shared, FloatingPanel, MemoryLayerStore, PanelOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let args = cli::parse();

    // Load config before logging init so the config can supply the filter
    let config = match &args.config {
        Some(path) => overlay_config::load_from_path(Path::new(path)),
        None => overlay_config::load_config(),
    }
    .unwrap_or_else(|e| {
        eprintln!("config load failed, using defaults: {e}");
        OverlayConfig::default()
    });

    // Initialize logging: CLI override wins, then config, then default
    let directive = args.log_level.as_deref().unwrap_or(&config.logging.filter);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .unwrap_or_else(|_| "overlay=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Overlay v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::info!("Panel title: {}", config.panel.title);

    let options = PanelOptions {
        title: config.panel.title.clone(),
        content_url: config.content.url.clone(),
        bootstrap_script: config.content.bootstrap_script.clone(),
        homepage_url: config.links.homepage.clone(),
        version: env!("CARGO_PKG_VERSION").into(),
    };

    let store = shared(MemoryLayerStore::new());
    let windowing = Arc::new(sim::SimWindowing);
    let (surface, mut session_done) = sim::SimSurface::new();
    let tabs = Arc::new(sim::SimTabs);

    let mut panel = FloatingPanel::new(options, windowing, Arc::new(surface), tabs, store);
    let mut events = panel.subscribe();

    panel.show().expect("failed to open panel");

    while let Ok(event) = events.recv().await {
        if event == PanelEvent::PopupShown {
            break;
        }
    }
    tracing::info!("panel visible, content session running");

    // Hide the panel once the content session finishes its script
    let _ = session_done.recv().await;
    panel.hide();

    while let Ok(event) = events.recv().await {
        if event == PanelEvent::PopupHidden {
            break;
        }
    }

    if let Some(position) = panel.position() {
        tracing::info!(%position, "panel position remembered for next open");
    }

    panel.destroy();
    tracing::info!("Shutdown complete");
}
