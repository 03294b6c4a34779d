//! HTTP front end
//!
//! One listener, one fallback handler. Requests are dispatched by path
//! suffix to the runtime cache, the bundle pipeline or static responses.
//! Upstream failures become `500` responses carrying the error text.

mod handlers;
pub mod route;

pub use route::{PathParams, Route};

use crate::bundle::BundleService;
use crate::config::Config;
use crate::error::{ProxyError, ProxyResult};
use crate::runtime::{RuntimeCache, Sentinels};
use crate::upstream::{HttpUpstream, Locators, Upstream};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub runtimes: Arc<RuntimeCache>,
    pub bundles: Arc<BundleService>,
}

impl AppState {
    /// Wire both pipelines to one upstream
    pub fn new(upstream: Arc<dyn Upstream>, locators: Locators, sentinels: Sentinels) -> Self {
        Self {
            runtimes: Arc::new(RuntimeCache::new(
                Arc::clone(&upstream),
                locators.clone(),
                sentinels,
            )),
            bundles: Arc::new(BundleService::new(upstream, locators)),
        }
    }

    /// Build state talking to the configured remote host
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpUpstream::new(&config.upstream)),
            Locators::from_config(&config.upstream),
            Sentinels::from_config(&config.runtime),
        )
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(handlers::dispatch)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM
///
/// Failing to bind is returned as `ProxyError::Bind`.
pub async fn serve(addr: SocketAddr, state: AppState) -> ProxyResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ProxyError::bind(addr, e))?;
    let local = listener
        .local_addr()
        .map_err(|e| ProxyError::io("reading listener address", e))?;
    info!("Listening on http://{}", local);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ProxyError::io("serving HTTP", e))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
