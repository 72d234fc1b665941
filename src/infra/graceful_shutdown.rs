//! Graceful shutdown handling
//!
//! The HTTP server stops accepting connections on SIGINT/SIGTERM, then waits
//! for in-flight verifications (each may be running a calldata subprocess)
//! to finish before the process exits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::signal;
use tracing::{info, warn};

/// Counts requests currently being handled.
#[derive(Debug, Default)]
pub struct RequestTracker {
    active: AtomicU64,
    total: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request; the returned guard marks it finished when dropped.
    pub fn request_start(&self) -> RequestGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        RequestGuard { tracker: self }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Wait until no request is active. Returns `false` on timeout.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();

        while self.active_count() > 0 {
            if start.elapsed() > timeout {
                warn!(
                    active = self.active_count(),
                    "Timeout waiting for requests to drain"
                );
                return false;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        info!(total = self.total_count(), "All requests drained");
        true
    }
}

/// Marks one request as finished on drop.
pub struct RequestGuard<'a> {
    tracker: &'a RequestTracker,
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Middleware that registers every request with the tracker.
pub async fn track_requests(
    State(tracker): State<Arc<RequestTracker>>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = tracker.request_start();
    next.run(request).await
}

/// Completes when SIGINT or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
