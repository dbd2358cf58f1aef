use clap::Parser;

/// Overlay — a floating layer-editing panel over an isolated content surface.
#[derive(Parser, Debug)]
#[command(name = "overlay", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log filter override (e.g. overlay=debug).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
