//! moredice - dice server daemon

use std::path::PathBuf;

use anyhow::Result;
use moredice::{config::Config, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moredice=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var_os("MOREDICE_CONFIG").map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
