//! Node wiring: configuration, the run race, process entry helpers.

pub mod config;
pub mod race;
pub mod signal;

use anyhow::{Context, Result};
use drop_mesh::{MdnsCourier, SingleShotListener};
use tracing::{info, warn};

pub use config::{Cli, DropConfig};
pub use race::{Outcome, RaceCoordinator};

/// One full run against the real network, stdin and stdout.
///
/// The advertisement is withdrawn on every path out of here: explicitly on
/// success, by its drop guard on error.
pub async fn run(config: &DropConfig) -> Result<Outcome> {
    let identity = config.identity();
    let advertisement = drop_mesh::advertise(&identity).context("register on mDNS")?;

    let listener = SingleShotListener::bind(config.listen_addr())
        .await
        .context("bind listener")?;

    let courier = MdnsCourier::new(config.target(), config.discovery_window());
    if config.remote.is_empty() {
        warn!("no --remote given; local input has nowhere to go");
    } else {
        info!("local input goes to {}", courier.target());
    }
    info!("waiting for input or a connection on port {}", config.port);

    let race = RaceCoordinator::new(courier, listener, config.run_timeout());
    let mut stdout = tokio::io::stdout();
    let outcome = race
        .run(tokio::io::stdin(), &mut stdout, signal::shutdown_signal())
        .await?;

    advertisement.shutdown().await;
    Ok(outcome)
}
