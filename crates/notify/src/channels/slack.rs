//! Slack Web API channel.
//!
//! Approval requests are interactive messages posted with a bot token; the
//! decision arrives back through Slack's interactivity callback, whose
//! `response_url` is used to replace the original message.

use async_trait::async_trait;
use incident::VerificationReport;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::{ApprovalRequest, NotifyEvent};
use crate::NotifyChannel;

/// Default Slack Web API base URL.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// `action_id` of the approve button.
pub const APPROVE_ACTION_ID: &str = "approve_remediation";

/// `action_id` of the deny button.
pub const DENY_ACTION_ID: &str = "deny_remediation";

/// Per-request timeout for Slack calls.
const SLACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack bot channel.
pub struct SlackChannel {
    bot_token: Option<String>,
    channel: Option<String>,
    api_url: String,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a Slack channel. It is enabled only when both token and channel are set.
    #[must_use]
    pub fn new(bot_token: Option<String>, channel: Option<String>) -> Self {
        let bot_token = bot_token.filter(|t| !t.is_empty());
        let channel = channel.filter(|c| !c.is_empty());

        if bot_token.is_some() && channel.is_some() {
            debug!("Slack notifications enabled");
        } else {
            debug!("Slack notifications disabled (SLACK_BOT_TOKEN or SLACK_CHANNEL not set)");
        }

        Self {
            bot_token,
            channel,
            api_url: DEFAULT_SLACK_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at a different API base URL (proxies, tests).
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Format an event as a `chat.postMessage` payload.
    fn format_message(channel: &str, event: &NotifyEvent) -> SlackMessage {
        match event {
            NotifyEvent::ApprovalRequested { request, .. } => SlackMessage {
                channel: channel.to_string(),
                text: format!("Alert: {} - {}", request.alert_name, request.analysis),
                blocks: Self::approval_blocks(request),
                attachments: vec![],
            },
            NotifyEvent::IncidentReport { report, .. } => SlackMessage {
                channel: channel.to_string(),
                text: format!("{}: {}", report.title(), report.message),
                blocks: vec![],
                attachments: vec![SlackAttachment {
                    color: event.severity().color().to_string(),
                    blocks: Self::report_blocks(report),
                    ts: event.timestamp().timestamp(),
                }],
            },
        }
    }

    /// Blocks for an interactive approval request.
    fn approval_blocks(request: &ApprovalRequest) -> Vec<Value> {
        let evidence = if request.evidence.is_empty() {
            "No evidence collected.".to_string()
        } else {
            format!("```{}```", request.evidence)
        };

        vec![
            section(&format!(":rotating_light: *New Alert: {}*", request.alert_name)),
            json!({
                "type": "section",
                "text": mrkdwn(&format!("*Root cause analysis:* {}", request.analysis)),
                "fields": [
                    mrkdwn(&format!("*Target:* `{}`", request.target)),
                    mrkdwn(&format!("*Namespace:* `{}`", request.namespace)),
                    mrkdwn(&format!("*Summary:* {}", request.summary)),
                    mrkdwn(&format!("*Proposed Action:* `{}`", request.action)),
                ]
            }),
            section(&format!("*Reason:* {}", or_dash(&request.reason))),
            section(&format!("*Evidence:*\n{evidence}")),
            json!({
                "type": "actions",
                "elements": [
                    {
                        "type": "button",
                        "text": plain("Approve Remediation"),
                        "style": "primary",
                        "action_id": APPROVE_ACTION_ID,
                        "value": request.plan_payload,
                        "confirm": {
                            "title": plain("Confirm Action"),
                            "text": mrkdwn(&format!(
                                "Are you sure you want to run `{}` on `{}`?",
                                request.action, request.target
                            )),
                            "confirm": plain("Approve"),
                            "deny": plain("Cancel")
                        }
                    },
                    {
                        "type": "button",
                        "text": plain("Deny"),
                        "style": "danger",
                        "action_id": DENY_ACTION_ID,
                        "value": "denied"
                    }
                ]
            }),
        ]
    }

    /// Blocks for the final incident report.
    fn report_blocks(report: &VerificationReport) -> Vec<Value> {
        let evidence = if report.evidence.is_empty() {
            "No evidence collected.".to_string()
        } else {
            format!("```{}```", report.evidence)
        };

        vec![
            section(&format!("{} *{}*", report.status.emoji(), report.title())),
            json!({
                "type": "section",
                "fields": [
                    mrkdwn(&format!("*Target:*\n`{}`", report.target)),
                    mrkdwn(&format!("*Namespace:*\n`{}`", report.namespace)),
                    mrkdwn(&format!("*Status:*\n{}", report.status.label())),
                    mrkdwn(&format!("*Action:*\n`{}`", report.action)),
                ]
            }),
            section(&format!("*Diagnosis:* {}", or_dash(&report.analysis))),
            section(&format!("*Evidence:*\n{evidence}")),
            section(&format!("*Remediation:* {}", or_dash(&report.message))),
            section(&format!("*Verification:* {}", report.verification_details)),
        ]
    }

    async fn check_response(response: reqwest::Response) -> Result<(), ChannelError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                channel = "slack",
                status = %status,
                body = %body,
                "Slack request failed"
            );
            return Err(ChannelError::Other(format!("Slack returned {status}: {body}")));
        }

        Ok(())
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.bot_token.is_some() && self.channel.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let token = self
            .bot_token
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("SLACK_BOT_TOKEN".to_string()))?;
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("SLACK_CHANNEL".to_string()))?;

        let payload = Self::format_message(channel, event);

        debug!(channel = "slack", event_type = ?event.title(), "Sending notification");

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_url))
            .bearer_auth(token)
            .timeout(SLACK_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Self::check_response(response).await;
        }
        let body: SlackApiResponse = response.json().await?;

        if body.ok {
            debug!(channel = "slack", "Notification sent successfully");
            Ok(())
        } else {
            let error = body.error.unwrap_or_else(|| "unknown_error".to_string());
            warn!(channel = "slack", error = %error, "Slack API rejected message");
            Err(ChannelError::Api(error))
        }
    }

    async fn update_message(&self, reference: &str, text: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(reference)
            .timeout(SLACK_TIMEOUT)
            .json(&json!({ "replace_original": true, "text": text }))
            .send()
            .await?;

        Self::check_response(response).await?;
        debug!(channel = "slack", "Original message updated");
        Ok(())
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackMessage {
    channel: String,
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    blocks: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    color: String,
    blocks: Vec<Value>,
    /// Unix seconds shown in the attachment footer
    ts: i64,
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn mrkdwn(text: &str) -> Value {
    json!({ "type": "mrkdwn", "text": text })
}

fn plain(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text })
}

fn section(text: &str) -> Value {
    json!({ "type": "section", "text": mrkdwn(text) })
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}
