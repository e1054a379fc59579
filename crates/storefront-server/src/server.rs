//! API server implementation.

use crate::error::ServerError;
use crate::routes;
use crate::state::AppState;
use storefront_core::StorefrontConfig;
use storefront_store::{bootstrap_admin, open_store};
use tokio::net::TcpListener;

/// The storefront API server.
pub struct StorefrontServer {
    config: StorefrontConfig,
}

impl StorefrontServer {
    /// Create a new server with the given configuration.
    pub fn new(config: StorefrontConfig) -> Self {
        Self { config }
    }

    /// Open storage, seed it and create the bootstrap admin.
    pub async fn build_state(&self) -> Result<AppState, ServerError> {
        let store = open_store(&self.config.database).await?;
        let state = AppState::new(store, &self.config);
        bootstrap_admin(state.accounts(), &self.config.auth).await?;
        Ok(state)
    }

    /// Start the server and serve until Ctrl-C or SIGTERM.
    pub async fn run(&self) -> Result<(), ServerError> {
        let state = self.build_state().await?;
        let app = routes::create_router(state);

        let addr = self.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::StartupFailed(format!("{addr}: {e}")))?;
        tracing::info!(address = %addr, "Storefront API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::StartupFailed(e.to_string()))?;

        tracing::info!("Storefront API stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_addr(&self) -> &str {
        &self.config.server.bind
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Received shutdown signal");
}
