//! Server lifecycle: bind, serve, shut down gracefully.
//!
//! `serve` runs until the shutdown future resolves; the binary passes a
//! Ctrl-C listener, tests pass a oneshot receiver.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Bind the listener. Kept separate so callers can learn the real port.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, String> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))
}

/// Serve the API on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, ctx: ApiContext, shutdown: F) -> Result<(), String>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;
    let app = api_router(ctx);

    tracing::info!(%addr, "API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Resolves on Ctrl-C.
pub async fn ctrl_c_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {e}"),
    }
}
