use std::sync::Arc;

use tokio::net::TcpListener;

use ladder_engine::Ladder;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Squash ladder HTTP server. Owns the one [`Ladder`] for its log file.
pub struct LadderServer {
    state: AppState,
}

impl LadderServer {
    /// Open the configured log. Fails if its tail is unreadable.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let ladder = Ladder::open(&config.log.path, config.log.log_config())?;
        Ok(Self::with_ladder(config, Arc::new(ladder)))
    }

    pub fn with_ladder(config: ServerConfig, ladder: Arc<Ladder>) -> Self {
        Self {
            state: AppState {
                ladder,
                config: Arc::new(config),
            },
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let bind_addr = self.state.config.bind_addr;
        let app = self.router();
        let listener = TcpListener::bind(bind_addr).await?;
        tracing::info!(
            %bind_addr,
            log = %self.state.config.log.path.display(),
            "ladder server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
