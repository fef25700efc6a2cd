//! HTTP Module
//!
//! Exposes the store over HTTP using axum.
//!
//! ## Routes
//! - `POST   /kv/set`            JSON `{key, value}`
//! - `GET    /kv/get?key=`
//! - `DELETE /kv/delete?key=`
//! - `GET    /health`
//! - `GET    /metrics`           Prometheus text format
//!
//! Every response, including 405s and extractor rejections, is counted by the
//! `track_requests` layer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::Config;
use crate::error::{Result, TxkvError};
use crate::metrics::Metrics;
use crate::store::Store;
use crate::txlog::Log;

pub mod handlers;

/// Shared state for request handlers
pub struct AppState<L> {
    /// The store being served
    store: Arc<Store<L>>,

    /// Request counters
    metrics: Metrics,

    /// Logging context for everything this service emits
    span: Span,
}

impl<L: Log> AppState<L> {
    pub fn new(store: Arc<Store<L>>, span: Span) -> Result<Self> {
        let metrics = Metrics::new()
            .map_err(|e| TxkvError::Server(format!("failed to register metrics: {}", e)))?;

        Ok(Self {
            store,
            metrics,
            span,
        })
    }

    pub fn store(&self) -> &Arc<Store<L>> {
        &self.store
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Create the HTTP router with all endpoints
pub fn create_router<L: Log + 'static>(state: Arc<AppState<L>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics::<L>))
        .route("/kv/set", post(handlers::set_key::<L>))
        .route("/kv/get", get(handlers::get_key::<L>))
        .route("/kv/delete", delete(handlers::delete_key::<L>))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            handlers::track_requests::<L>,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
///
/// Stops accepting connections once `shutdown` completes, then waits for
/// in-flight requests to finish.
pub async fn serve<L, F>(listener: TcpListener, state: Arc<AppState<L>>, shutdown: F) -> Result<()>
where
    L: Log + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(parent: &state.span, %addr, "HTTP server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| TxkvError::Server(format!("HTTP server error: {}", e)))
}

/// Run the service: bind, serve until `shutdown`, drain, then close the store
///
/// Draining is bounded by `config.shutdown_timeout_ms`. The store is closed
/// in every case; mutations that outlive the drain window fail with
/// `AppendFailed` instead of writing to a closed log.
pub async fn run<L, F>(config: &Config, state: Arc<AppState<L>>, shutdown: F) -> Result<()>
where
    L: Log + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.listen_socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| TxkvError::Server(format!("failed to bind {}: {}", addr, e)))?;

    // Drain timer starts when the signal fires, not when serving starts
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        shutdown.await;
        let _ = signalled_tx.send(());
        let _ = stop_tx.send(());
    });

    let mut server = tokio::spawn(serve(listener, Arc::clone(&state), async move {
        let _ = stop_rx.await;
    }));

    let drain = Duration::from_millis(config.shutdown_timeout_ms);
    let served = tokio::select! {
        joined = &mut server => Some(joined),
        _ = async {
            let _ = signalled_rx.await;
            tokio::time::sleep(drain).await;
        } => None,
    };

    let serve_result = match served {
        Some(Ok(result)) => result,
        Some(Err(e)) => Err(TxkvError::Server(format!("server task failed: {}", e))),
        None => {
            tracing::warn!(parent: &state.span, ?drain, "shutdown drain timed out");
            server.abort();
            Ok(())
        }
    };

    tracing::info!(parent: &state.span, "closing transaction log");
    state.store.close()?;
    serve_result
}
