use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ccline::app;
use ccline::cli::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // A broken statusline must never crash the surface that embeds it:
    // log the failure and exit clean.
    if let Err(e) = app::run(cli).await {
        tracing::error!("ccline failed: {e:#}");
    }
    Ok(())
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ccline=debug,ccline_core=debug")
    } else {
        EnvFilter::try_from_env("CCLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout is the display surface; diagnostics go to stderr only.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
