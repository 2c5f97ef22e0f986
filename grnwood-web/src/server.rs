//! Grnwood Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use grnwood_core::GatewayConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main grnwood web server
pub struct GrnwoodServer {
    address: String,
    state: AppState,
}

impl GrnwoodServer {
    /// Create a new server, connecting to the graph
    pub async fn new(config: GatewayConfig) -> WebResult<Self> {
        let address = config.address();
        let state = AppState::new(config).await?;

        Ok(Self { address, state })
    }

    /// Serve until a shutdown signal arrives, then close the graph pools
    pub async fn start(self) -> WebResult<()> {
        info!("Starting grnwood web server");

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", self.address);

        let result = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        self.state.driver.close().await;

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for GrnwoodServer
pub struct GrnwoodServerBuilder {
    config: GatewayConfig,
}

impl GrnwoodServerBuilder {
    /// Create a new server builder
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<GrnwoodServer> {
        GrnwoodServer::new(self.config).await
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
