//! Webhook server listener
//!
//! Binds the HTTP listener, starts the broadcast loop and registry cleanup,
//! and serves the router until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::{Error, Result};
use crate::registry::ListenerRegistry;
use crate::relay::Relay;
use crate::server::auth::BearerAuth;
use crate::server::config::ServerConfig;
use crate::server::routes::{build_router, AppState};

/// Webhook relay server
pub struct WebhookServer {
    config: ServerConfig,
    registry: Arc<ListenerRegistry>,
    relay: Arc<Relay>,
    auth: Arc<BearerAuth>,
}

impl WebhookServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(ListenerRegistry::with_config(config.registry.clone()));
        let relay = Arc::new(Relay::new(Arc::clone(&registry)));
        let auth = Arc::new(BearerAuth::new(config.bearer.clone()));

        Self {
            config,
            registry,
            relay,
            auth,
        }
    }

    /// Get a reference to the listener registry
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// Get a reference to the relay
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the HTTP router sharing this server's registry and relay
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: Arc::clone(&self.registry),
            relay: Arc::clone(&self.relay),
            auth: Arc::clone(&self.auth),
        };
        build_router(state, self.config.max_body_size)
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_addr;
        TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// On shutdown every listener is removed, which closes all open log
    /// streams.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            auth = self.auth.is_enabled(),
            "Webhook server listening"
        );

        if self.relay.start().is_none() {
            tracing::debug!("Broadcast loop already running");
        }
        let cleanup_handle = self.registry.spawn_cleanup_task();

        let registry = Arc::clone(&self.registry);
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                registry.clear();
            })
            .await;

        // Stop cleanup task on shutdown
        cleanup_handle.abort();

        let stats = self.registry.metrics().snapshot();
        tracing::info!(
            published = stats.messages_published,
            deliveries = stats.deliveries,
            listeners = stats.listeners_registered,
            "Webhook server stopped"
        );

        result.map_err(Error::from)
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
