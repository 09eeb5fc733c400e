//! HTTP surface for the login flow.
//!
//! `/authorize` opens a session, `/callback` completes it, `/token` consumes it.

pub mod authorize;
pub mod handlers;
pub mod issuer;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::session::SessionStore;
use issuer::{OpaqueTokenIssuer, TokenIssuer};

/// Login state server.
pub struct AuthServer {
    config: Config,
    store: Arc<SessionStore>,
    issuer: Arc<dyn TokenIssuer>,
}

impl AuthServer {
    /// Create a server issuing opaque tokens.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_issuer(config, Arc::new(OpaqueTokenIssuer))
    }

    /// Create a server with a custom token issuer.
    #[must_use]
    pub fn with_issuer(config: Config, issuer: Arc<dyn TokenIssuer>) -> Self {
        let store = Arc::new(SessionStore::new(config.session.clone()));
        Self { config, store, issuer }
    }

    /// Session store backing this server.
    #[must_use]
    pub const fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Run the HTTP server until CTRL+C.
    ///
    /// # Errors
    ///
    /// Returns error on bind or server failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        let router = routes::create_router(self.config, self.store, self.issuer);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!("HTTP server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for AuthServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServer").field("config", &self.config).finish_non_exhaustive()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
