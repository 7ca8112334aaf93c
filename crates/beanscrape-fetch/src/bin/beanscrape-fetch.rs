use anyhow::{Context, Result};
use beanscrape_fetch::{FetchConfig, Fetcher, HttpPageSource};
use beanscrape_monitoring::{init_logging, LogExt, LoggingConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging(&LoggingConfig::from_env("beanscrape-fetch"))
        .context("Failed to initialize logging")?;

    let config = FetchConfig::load()
        .log_err("Invalid fetch configuration")
        .context("Failed to load configuration")?;

    let source = HttpPageSource::new(&config).context("Failed to create HTTP client")?;

    // Per-endpoint failures are logged by the fetcher and do not change the exit code
    Fetcher::new(config, source).run().await;

    Ok(())
}
