use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use archflow_core::{ArchFlowConfig, ArchFlowError, Result};

use crate::{create_router, AppState};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub async fn new(addr: SocketAddr, config: Arc<ArchFlowConfig>) -> Result<Self> {
        let state = AppState::new(config).await?;
        Ok(Self { state, addr })
    }

    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(ArchFlowError::Io)?;

        info!("ArchFlow API listening on http://{}", self.addr);
        info!("  GET  /api/health - Health check");
        info!("  POST /api/auth/register - Create an account");
        info!("  POST /api/auth/login - Log in");
        info!("  GET  /api/auth/me - Current user");
        info!("  POST /api/analyze - Analyze a repository");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(ArchFlowError::Io)?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
