//! Configuration for the verification service.

use clap::Parser;
use std::time::Duration;

use notify::channels::slack::DEFAULT_SLACK_API_URL;

use crate::verifier::VerifySettings;

/// Confirms remediation outcomes and reports them.
#[derive(Debug, Clone, Parser)]
#[command(name = "verification-server")]
#[command(about = "Verify remediation outcomes and publish the incident report")]
#[command(version)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Slack bot token
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_bot_token: Option<String>,

    /// Slack channel reports are posted to
    #[arg(long, env = "SLACK_CHANNEL")]
    pub slack_channel: Option<String>,

    /// Slack Web API base URL
    #[arg(long, env = "SLACK_API_URL", default_value = DEFAULT_SLACK_API_URL)]
    pub slack_api_url: String,

    /// Treat the human channel as a logging no-op
    #[arg(long, env = "NOTIFY_DISABLED")]
    pub notify_disabled: bool,

    /// Seconds to wait before the first inspection
    #[arg(long, env = "SETTLE_DELAY_SECS", default_value_t = 15)]
    pub settle_delay_secs: u64,

    /// Seconds after the settle delay before verification gives up
    #[arg(long, env = "VERIFY_DEADLINE_SECS", default_value_t = 120)]
    pub verify_deadline_secs: u64,

    /// First delay between polls, in milliseconds
    #[arg(long, env = "POLL_INITIAL_BACKOFF_MS", default_value_t = 2000)]
    pub poll_initial_backoff_ms: u64,

    /// Upper bound on the delay between polls, in milliseconds
    #[arg(long, env = "POLL_MAX_BACKOFF_MS", default_value_t = 15000)]
    pub poll_max_backoff_ms: u64,

    /// Pod label whose value is the workload (deployment) name
    #[arg(long, env = "WORKLOAD_LABEL_KEY", default_value = "app")]
    pub workload_label_key: String,
}

impl Config {
    #[must_use]
    pub fn verify_settings(&self) -> VerifySettings {
        VerifySettings {
            settle_delay: Duration::from_secs(self.settle_delay_secs),
            deadline: Duration::from_secs(self.verify_deadline_secs),
            initial_backoff: Duration::from_millis(self.poll_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.poll_max_backoff_ms),
            workload_label_key: self.workload_label_key.clone(),
        }
    }
}
