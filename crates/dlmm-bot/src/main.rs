//! Dual-listing market maker - Entry Point
//!
//! Runs the control loop against the configured venue, or with `--flatten`
//! closes every open position and exits.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Delta-neutral market maker for a dual-listed instrument pair
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DLMM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Flatten every open position at dominating prices, then exit
    #[arg(long)]
    flatten: bool,

    /// Stop after this many ticks (runs until Ctrl-C when omitted)
    #[arg(long)]
    max_steps: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dlmm_telemetry::init_logging()?;

    info!("Starting dlmm-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = dlmm_bot::AppConfig::load(args.config)?;
    info!(
        liquid = %config.instruments.liquid,
        illiquid = %config.instruments.illiquid,
        "Configuration loaded"
    );

    let app = dlmm_bot::Application::new(config)?;

    if args.flatten {
        app.flatten().await?;
        return Ok(());
    }

    let summary = app.run(args.max_steps).await?;
    info!(
        ticks = summary.ticks,
        completed = summary.completed,
        skipped = summary.skipped,
        "Market maker stopped"
    );

    Ok(())
}
