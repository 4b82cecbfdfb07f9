use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use drop_app::{Cli, DropConfig, Outcome};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = start(cli) {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

fn start(cli: Cli) -> Result<Outcome> {
    let config = cli.into_config()?;
    log_config(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    let result = runtime.block_on(drop_app::run(&config));
    // stdin reads block a thread that cannot be cancelled; don't wait for it
    runtime.shutdown_background();

    let outcome = result?;
    tracing::info!("finished: {outcome}");
    Ok(outcome)
}

fn log_config(config: &DropConfig) {
    tracing::info!("mydrop starting...");
    tracing::info!("uid        = {}", config.uid);
    tracing::info!("remote     = {}", config.remote);
    tracing::info!("port       = {}", config.port);
    tracing::debug!("ip         = {} (reserved)", config.ip);
    tracing::debug!("host       = {} (reserved)", config.host);
}
