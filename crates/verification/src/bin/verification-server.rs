//! Verification service binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cluster::KubeControlPlane;
use incident::telemetry::init_tracing;
use notify::{Notifier, SlackChannel};
use verification::{build_router, Config, ServerState, Verifier};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&["verification", "verification_server"])?;

    let config = Config::parse();
    info!("Starting verification service...");

    let cluster = KubeControlPlane::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let slack = SlackChannel::new(config.slack_bot_token.clone(), config.slack_channel.clone())
        .with_api_url(config.slack_api_url.clone());
    let notifier = Notifier::slack(slack, config.notify_disabled);
    info!(
        enabled = notifier.has_channels(),
        channels = notifier.channel_count(),
        "Notifier ready"
    );

    let settings = config.verify_settings();
    info!(
        settle_secs = settings.settle_delay.as_secs(),
        deadline_secs = settings.deadline.as_secs(),
        workload_label = %settings.workload_label_key,
        "Verification settings"
    );

    let verifier = Verifier::new(Arc::new(cluster), Arc::new(notifier), settings);
    let app = build_router(Arc::new(ServerState {
        verifier: Arc::new(verifier),
    }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Verification service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
