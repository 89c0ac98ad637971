use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use blobstate_store::Store;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinError;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;
use crate::shutdown::shutdown_signal;
use crate::templates::Templates;

/// How long in-flight requests may run after shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// blobstate HTTP server.
///
/// Owns the store for its whole life: it is disconnected exactly once, after
/// the listener has stopped.
pub struct BlobServer {
    config: Arc<ServerConfig>,
    store: Arc<dyn Store>,
    healthy: Arc<AtomicBool>,
    grace: Duration,
}

impl BlobServer {
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            healthy: Arc::new(AtomicBool::new(false)),
            grace: SHUTDOWN_GRACE,
        }
    }

    /// Override the shutdown grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Whether `/health` currently reports `pass`.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    /// Shared handler state.
    pub fn state(&self) -> ServerResult<AppState> {
        Ok(AppState {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            healthy: Arc::clone(&self.healthy),
            templates: Arc::new(Templates::new()?),
        })
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        Ok(build_router(self.state()?))
    }

    /// Serve until a termination signal arrives, then shut down.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        self.run(listener, async {
            if let Err(err) = shutdown_signal().await {
                tracing::error!(error = %err, "cannot listen for signals, shutting down");
            }
        })
        .await
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// New connections stop at once; in-flight requests get the grace period
    /// before they are aborted. The store is disconnected afterwards either
    /// way, and a disconnect failure is logged rather than returned.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> ServerResult<()> {
        let local_addr = listener.local_addr()?;
        let app = self.router()?;

        let stop = Arc::new(Notify::new());
        let stopped = Arc::clone(&stop);
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move { stopped.notified().await });
        self.healthy.store(true, Ordering::SeqCst);
        let mut serving = tokio::spawn(async move { server.await });

        tracing::info!(
            addr = %local_addr,
            backend = %self.store.backend(),
            env = %self.config.env_name,
            "HTTP server started"
        );

        let outcome = tokio::select! {
            joined = &mut serving => {
                self.healthy.store(false, Ordering::SeqCst);
                flatten(joined)
            }
            () = shutdown => {
                self.healthy.store(false, Ordering::SeqCst);
                tracing::info!("gracefully shutting down HTTP server");
                stop.notify_one();
                match tokio::time::timeout(self.grace, &mut serving).await {
                    Ok(joined) => flatten(joined),
                    Err(_) => {
                        tracing::warn!(
                            grace = ?self.grace,
                            "grace period elapsed, aborting in-flight requests"
                        );
                        serving.abort();
                        Ok(())
                    }
                }
            }
        };

        if let Err(err) = self.store.disconnect().await {
            tracing::warn!(error = %err, "store failed to disconnect");
        }
        tracing::info!("HTTP server stopped");
        outcome
    }
}

fn flatten(joined: Result<std::io::Result<()>, JoinError>) -> ServerResult<()> {
    joined
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}
