//! Babel Bot - Main entry point.

use anyhow::Result;
use babel_bot::run;
use babel_common::config::Config;
use babel_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration; a missing bot token stops here
    let config = Config::load_with_env()?;

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Babel Bot v{}", env!("CARGO_PKG_VERSION"));
    match &config.source {
        Some(path) => tracing::info!(path = %path.display(), "Config loaded"),
        None => tracing::info!("Config file not found, using defaults"),
    }

    run(&config).await
}
