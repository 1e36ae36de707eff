//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together:
//! - Store (in-memory or PostgreSQL)
//! - Workflows (orders, products, users)
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Open the store
//! 3. Start API server
//! 4. Wait for SIGINT or a shutdown request
//! 5. Graceful shutdown: stop accepting connections, drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use shop_store::{MemoryStore, UnitOfWork};

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The shop daemon.
pub struct Daemon<U: UnitOfWork + 'static> {
    /// Configuration
    config: Config,
    /// Store shared by all workflows
    store: Arc<U>,
    /// Cancelled to stop the API server
    shutdown: CancellationToken,
}

impl Daemon<MemoryStore> {
    /// Create a daemon backed by the in-memory store.
    pub fn new_memory(config: Config) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }
}

#[cfg(feature = "postgres")]
impl Daemon<shop_store::PgStore> {
    /// Create a daemon backed by PostgreSQL, using `DATABASE_URL` from config.
    pub async fn connect(config: Config) -> DaemonResult<Self> {
        let url = config.store.database_url.clone().ok_or_else(|| {
            DaemonError::Config("DATABASE_URL is required for the postgres store".to_string())
        })?;

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.store.max_connections)
            .connect(&url)
            .await
            .map_err(shop_store::StoreError::from)?;

        info!(max_connections = config.store.max_connections, "Connected to PostgreSQL");
        Ok(Self::new(config, Arc::new(shop_store::PgStore::new(pool))))
    }
}

impl<U: UnitOfWork + 'static> Daemon<U> {
    /// Create a new daemon over `store`.
    pub fn new(config: Config, store: Arc<U>) -> Self {
        Self {
            config,
            store,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the daemon when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT or the
    /// shutdown token).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            store = %self.config.store.backend,
            "Starting shop daemon"
        );

        let (api_addr, server) = self.start_api_server().await?;
        info!(%api_addr, "API server started");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
            }
            _ = self.shutdown.cancelled() => {
                info!("Shutdown requested");
            }
        }

        self.shutdown();
        server
            .await
            .map_err(|e| DaemonError::Server(format!("API server task failed: {}", e)))?;

        info!("Shutdown complete");
        Ok(())
    }

    /// Start the API server.
    ///
    /// Returns the bound address and the server task. The server stops
    /// accepting connections once the shutdown token is cancelled and exits
    /// after in-flight requests finish.
    async fn start_api_server(&self) -> DaemonResult<(SocketAddr, JoinHandle<()>)> {
        let state = Arc::new(ApiState::new(self.store.clone()));

        let router = create_router(state);
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            DaemonError::Server(format!("Failed to bind to {}: {}", addr, e))
        })?;

        let local_addr = listener.local_addr().map_err(|e| {
            DaemonError::Server(format!("Failed to get local address: {}", e))
        })?;

        let token = self.shutdown.clone();
        let server = tokio::spawn(async move {
            let signal = async move { token.cancelled().await };
            if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(signal).await {
                error!(error = %e, "API server error");
            }
        });

        Ok((local_addr, server))
    }

    /// Graceful shutdown.
    fn shutdown(&self) {
        info!("Initiating graceful shutdown");
        self.shutdown.cancel();
    }
}

// =============================================================================
// Tests
// =============================================================================
