//! Common test utilities - MoreDiceTest harness for end-to-end testing

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{routing::get, Json, Router};
use moredice::commands::CommandRunner;
use moredice::config::Config;
use moredice::service::Services;
use moredice::Server;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Find a random available port
fn free_addr() -> Result<SocketAddr> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Test harness that spawns a real moredice server on a random port
pub struct MoreDiceTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl MoreDiceTest {
    /// Start a new test server with default settings and ingestion enabled
    pub async fn start() -> Result<Self> {
        let mut config = Config::default();
        config.server.enabled = true;
        Self::start_with(config).await
    }

    /// Start a new test server; `bind_addr` and `db_path` are overridden
    pub async fn start_with(config: Config) -> Result<Self> {
        let addr = free_addr()?;
        let config = Config {
            bind_addr: addr,
            db_path: None, // In-memory for tests
            ..config
        };

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Services sharing the server's database
    pub fn services(&self) -> Services {
        self.server.services()
    }

    /// Command runner sharing the server's services
    pub fn commands(&self) -> CommandRunner {
        CommandRunner::new(self.server.services())
    }

    /// Drop and recreate all data, as `moredice_cli reset` does
    pub async fn reset(&self) -> Result<()> {
        self.server.db().reset().await
    }

    /// Issue a token for `user_id`
    pub async fn token_for(&self, user_id: i64) -> Result<String> {
        let issued = self.services().tokens.add_token(user_id, None).await?;
        Ok(issued.secret)
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

impl Drop for MoreDiceTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}

/// A tiny HTTP server serving one JSON document at `/faces.json`
pub struct FaceSource {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl FaceSource {
    pub async fn serve(document: serde_json::Value) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let document = Arc::new(document);

        let app = Router::new().route(
            "/faces.json",
            get(move || {
                let document = document.clone();
                async move { Json((*document).clone()) }
            }),
        );

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, handle })
    }

    pub fn url(&self) -> String {
        format!("http://{}/faces.json", self.addr)
    }
}

impl Drop for FaceSource {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
