//! moredice - weighted, nested custom dice for chat bots
//!
//! Users define dice whose faces carry weights and nested subfaces, group
//! them, share groups publicly and roll them. Commands arrive as chat lines
//! (see [`commands`]); external tools can push dice over HTTP with a token.

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod dice;
pub mod error;
pub mod naming;
pub mod service;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use config::Config;
use db::Database;
use service::Services;

/// The moredice server instance
pub struct Server {
    config: Config,
    db: Arc<Database>,
    services: Services,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(config.db_path.as_deref()).await?);
        let services = Services::new(db.pool().clone(), &config)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            db,
            services,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the database handle
    pub fn db(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Get the services bundle
    pub fn services(&self) -> Services {
        self.services.clone()
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.db.clone(), self.services.clone(), &self.config.server)
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("moredice listening on {}", local_addr);
        if self.config.server.enabled {
            info!("Dice ingestion enabled at {}", self.config.server.path);
        }

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("moredice shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
