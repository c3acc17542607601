//! Configuration for the remediation service.

use clap::Parser;
use std::time::Duration;

/// Executes approved remediation plans.
#[derive(Debug, Clone, Parser)]
#[command(name = "remediation-server")]
#[command(about = "Execute approved remediation plans against the cluster")]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Verification service endpoint results are reported to
    #[arg(
        long,
        env = "REFLECTION_AGENT_URL",
        default_value = "http://reflection-agent-svc:8080/log"
    )]
    pub reflection_agent_url: String,

    /// Seconds to wait for the verification hand-off
    #[arg(long, env = "HANDOFF_TIMEOUT_SECS", default_value_t = 5)]
    pub handoff_timeout_secs: u64,
}

impl Config {
    #[must_use]
    pub fn handoff_timeout(&self) -> Duration {
        Duration::from_secs(self.handoff_timeout_secs)
    }
}
