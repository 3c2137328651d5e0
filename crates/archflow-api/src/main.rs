use std::net::SocketAddr;
use std::sync::Arc;

use archflow_api::Server;
use archflow_core::ArchFlowConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archflow_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(ArchFlowConfig::load()?);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let server = Server::new(addr, config).await?;
    server.run().await?;
    Ok(())
}
