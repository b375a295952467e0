//! HTTP server service: binds the Axum app and runs it in a background task.
//!
//! Depends on the store service. Start order is ensured by the service manager;
//! this service builds the router from [AppState](crate::app::AppState) in
//! [start](Service::start) and runs the server until [stop](Service::stop).

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use crate::app::{AppState, build_app};
use crate::services::manager::{Service, ServiceHealth};

/// HTTP server service: binds and serves the Axum app in a background task.
pub struct HttpServerService {
    state: AppState,
    /// JoinHandle for the server task; set in start(), taken in stop().
    join_handle: RwLock<Option<JoinHandle<Result<()>>>>,
    /// Send to trigger server shutdown; set in start(), taken in stop().
    shutdown_tx: RwLock<Option<broadcast::Sender<()>>>,
}

impl HttpServerService {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            join_handle: RwLock::new(None),
            shutdown_tx: RwLock::new(None),
        }
    }
}

#[async_trait]
impl Service for HttpServerService {
    fn name(&self) -> &str {
        "http"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["store".to_string()]
    }

    async fn start(&self) -> Result<()> {
        info!(service = "http", "HTTP server service starting");

        let addr = self.state.config.bind_addr()?;
        let app = build_app(self.state.clone());
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("HTTP server: bind {} failed", addr))?;

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let mut shutdown_rx = shutdown_tx.subscribe();

        let serve_fut = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        });
        let join = tokio::spawn(async move { serve_fut.await.context("axum::serve") });

        *self.join_handle.write() = Some(join);
        *self.shutdown_tx.write() = Some(shutdown_tx);

        info!(
            service = "http",
            "Listening on http://{}; GraphQL: http://localhost:{}/graphql",
            addr,
            self.state.config.port
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let tx = self.shutdown_tx.write().take();
        let handle = self.join_handle.write().take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
        if let Some(h) = handle {
            h.await.context("HTTP server task panicked")??;
        }
        info!(service = "http", "HTTP server service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        match self.join_handle.read().as_ref() {
            Some(h) if !h.is_finished() => Ok(ServiceHealth::healthy()),
            _ => Ok(ServiceHealth::unhealthy("server task not running")),
        }
    }
}
