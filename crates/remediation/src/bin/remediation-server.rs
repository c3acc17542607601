//! Remediation service binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cluster::KubeControlPlane;
use incident::telemetry::init_tracing;
use incident::HandoffClient;
use remediation::{build_router, Config, Executor, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&["remediation", "remediation_server"])?;

    let config = Config::parse();
    info!("Starting remediation service...");

    let cluster = KubeControlPlane::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let executor = Executor::new(
        Arc::new(cluster),
        HandoffClient::new(config.reflection_agent_url.clone(), config.handoff_timeout()),
    );

    let app = build_router(Arc::new(ServerState {
        executor: Arc::new(executor),
    }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, reflection = %config.reflection_agent_url, "Remediation service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
