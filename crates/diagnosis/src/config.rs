//! Configuration for the diagnosis service.

use clap::Parser;
use std::time::Duration;

use notify::channels::slack::DEFAULT_SLACK_API_URL;

use crate::reasoning::{DEFAULT_MODEL, OPENAI_API_URL};

/// Alert diagnosis and approval gate.
#[derive(Debug, Clone, Parser)]
#[command(name = "diagnosis-server")]
#[command(about = "Diagnose alerts and gate remediation behind human approval")]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Slack bot token
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_bot_token: Option<String>,

    /// Slack channel approval requests are posted to
    #[arg(long, env = "SLACK_CHANNEL")]
    pub slack_channel: Option<String>,

    /// Slack Web API base URL
    #[arg(long, env = "SLACK_API_URL", default_value = DEFAULT_SLACK_API_URL)]
    pub slack_api_url: String,

    /// Treat the human channel as a logging no-op
    #[arg(long, env = "NOTIFY_DISABLED")]
    pub notify_disabled: bool,

    /// API key for the reasoning service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Chat completions endpoint
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_API_URL)]
    pub openai_base_url: String,

    /// Model used for diagnosis
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    /// Seconds to wait for the reasoning service
    #[arg(long, env = "REASONING_TIMEOUT_SECS", default_value_t = 30)]
    pub reasoning_timeout_secs: u64,

    /// Remediation service endpoint approved plans are handed to
    #[arg(
        long,
        env = "REMEDIATION_AGENT_URL",
        default_value = "http://remediation-agent-svc:8080/remediate"
    )]
    pub remediation_agent_url: String,

    /// Seconds to wait for the remediation hand-off
    #[arg(long, env = "HANDOFF_TIMEOUT_SECS", default_value_t = 10)]
    pub handoff_timeout_secs: u64,

    /// Group name used when a plan names none
    #[arg(long, env = "DEFAULT_DEPLOYMENT", default_value = "sample-app")]
    pub default_deployment: String,

    /// Namespace used when an alert carries none
    #[arg(long, env = "DEFAULT_NAMESPACE", default_value = "default")]
    pub default_namespace: String,

    /// Log lines collected as evidence
    #[arg(long, env = "LOG_TAIL_LINES", default_value_t = 20)]
    pub log_tail_lines: i64,
}

impl Config {
    #[must_use]
    pub fn reasoning_timeout(&self) -> Duration {
        Duration::from_secs(self.reasoning_timeout_secs)
    }

    #[must_use]
    pub fn handoff_timeout(&self) -> Duration {
        Duration::from_secs(self.handoff_timeout_secs)
    }
}
