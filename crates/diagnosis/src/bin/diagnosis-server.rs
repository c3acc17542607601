//! Diagnosis service binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use cluster::KubeControlPlane;
use diagnosis::{
    build_router, ApprovalGate, Config, Diagnoser, DiagnosisSettings, OpenAiReasoner, ServerState,
};
use incident::telemetry::init_tracing;
use incident::HandoffClient;
use notify::{Notifier, SlackChannel};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&["diagnosis", "diagnosis_server"])?;

    let config = Config::parse();
    info!("Starting diagnosis service...");

    let cluster = KubeControlPlane::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let reasoner = OpenAiReasoner::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.reasoning_timeout(),
    )
    .with_base_url(config.openai_base_url.clone());
    if !reasoner.is_configured() {
        warn!("No OPENAI_API_KEY configured - diagnosis will produce no plans");
    }

    let slack = SlackChannel::new(config.slack_bot_token.clone(), config.slack_channel.clone())
        .with_api_url(config.slack_api_url.clone());
    let notifier = Arc::new(Notifier::slack(slack, config.notify_disabled));
    info!(
        enabled = notifier.has_channels(),
        channels = notifier.channel_count(),
        "Notifier ready"
    );

    let diagnoser = Diagnoser::new(
        Arc::new(cluster),
        Arc::new(reasoner),
        Arc::clone(&notifier),
        DiagnosisSettings {
            default_deployment: config.default_deployment.clone(),
            default_namespace: config.default_namespace.clone(),
            log_tail_lines: config.log_tail_lines,
        },
    );
    let gate = ApprovalGate::new(
        notifier,
        HandoffClient::new(config.remediation_agent_url.clone(), config.handoff_timeout()),
    );

    let app = build_router(Arc::new(ServerState {
        diagnoser: Arc::new(diagnoser),
        gate: Arc::new(gate),
    }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, remediation = %config.remediation_agent_url, "Diagnosis service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
