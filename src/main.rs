use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

mod config;
mod core;
mod error;
mod render;
mod widgets;

use crate::core::player::Player;

#[derive(Parser, Debug)]
#[command(name = "wallpaper-widgets", about = "Calendar, clock and system info wallpaper renderer")]
struct Args {
    /// Widget file (XML)
    #[arg(short, long, default_value = "widgets.xml")]
    config: PathBuf,

    /// Override the wallpaper width from the widget file
    #[arg(long)]
    width: Option<u32>,

    /// Override the wallpaper height from the widget file
    #[arg(long)]
    height: Option<u32>,

    /// Refresh interval in seconds
    #[arg(short, long, default_value_t = 60)]
    interval: u64,

    /// Output mode: png, raw
    #[arg(long, default_value = "png")]
    output: String,

    /// Output file path (for png mode)
    #[arg(long, default_value = "wallpaper.png")]
    output_path: PathBuf,

    /// Regular TrueType font; the bundled DejaVu Sans is used otherwise
    #[arg(long)]
    font: Option<PathBuf>,

    /// Bold TrueType font, used for today's date
    #[arg(long)]
    bold_font: Option<PathBuf>,

    /// Render a single frame and exit
    #[arg(long)]
    once: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // raw frames go to stdout, keep logs on stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        "wallpaper-widgets v{} starting (config {}, every {}s)",
        env!("CARGO_PKG_VERSION"),
        args.config.display(),
        args.interval
    );

    let output_mode = args.output.parse().map_err(anyhow::Error::msg)?;
    let mut player = Player::new(config::PlayerConfig {
        config_path: args.config,
        width: args.width,
        height: args.height,
        interval: Duration::from_secs(args.interval.max(1)),
        font: args.font,
        bold_font: args.bold_font,
        output_mode,
        output_path: args.output_path,
        once: args.once,
    })?;

    player.run().await?;

    info!("wallpaper-widgets shutdown");
    Ok(())
}
