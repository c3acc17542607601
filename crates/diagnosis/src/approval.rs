//! Approval gate: turns a human decision into a remediation hand-off.
//!
//! Slack delivers button clicks as a form-encoded `payload` field holding a
//! JSON document. The HTTP handler acknowledges at once and runs
//! [`ApprovalGate::handle`] on a detached task.

use std::sync::Arc;

use incident::{HandoffClient, RemediationPlan};
use notify::{Notifier, APPROVE_ACTION_ID, DENY_ACTION_ID};
use serde::Deserialize;
use tracing::{error, info, warn};

/// Interaction type carrying button clicks.
const BLOCK_ACTIONS: &str = "block_actions";

/// Actor name used when the callback identifies nobody.
const UNKNOWN_ACTOR: &str = "unknown user";

/// The interactive callback document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    #[serde(default)]
    pub user: Option<SlackUser>,
    /// Where replacement text for the original message is posted
    #[serde(default)]
    pub response_url: Option<String>,
}

/// A clicked button.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockAction {
    #[serde(default)]
    pub action_id: String,
    /// Opaque button value; the serialized plan for the approve button
    #[serde(default)]
    pub value: Option<String>,
}

/// The clicking user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl InteractionPayload {
    /// Display name of whoever made the decision.
    #[must_use]
    pub fn actor(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|user| {
                [&user.username, &user.name, &user.id]
                    .into_iter()
                    .find_map(|field| field.as_deref().filter(|s| !s.trim().is_empty()))
            })
            .unwrap_or(UNKNOWN_ACTOR)
    }

    /// The decision this callback carries.
    #[must_use]
    pub fn decision(&self) -> Decision<'_> {
        if self.kind != BLOCK_ACTIONS {
            return Decision::Ignored;
        }
        match self.actions.first() {
            Some(action) if action.action_id == APPROVE_ACTION_ID => {
                Decision::Approve(action.value.as_deref().unwrap_or_default())
            }
            Some(action) if action.action_id == DENY_ACTION_ID => Decision::Deny,
            _ => Decision::Ignored,
        }
    }
}

/// A human decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    /// Approved; carries the opaque plan payload
    Approve(&'a str),
    Deny,
    /// Not a decision this gate handles
    Ignored,
}

/// How a callback was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// The plan was handed to remediation.
    Dispatched(RemediationPlan),
    /// The plan was approved but remediation could not be reached.
    DispatchFailed(RemediationPlan),
    Denied,
    /// The approve payload did not decode to a plan.
    InvalidPlan,
    Ignored,
}

/// Handles approval callbacks.
pub struct ApprovalGate {
    notifier: Arc<Notifier>,
    remediation: HandoffClient,
}

impl ApprovalGate {
    #[must_use]
    pub fn new(notifier: Arc<Notifier>, remediation: HandoffClient) -> Self {
        Self {
            notifier,
            remediation,
        }
    }

    /// Act on a callback.
    ///
    /// Approve: update the original message once, then hand the plan to
    /// remediation once. Deny: update the original message; remediation is
    /// never contacted.
    pub async fn handle(&self, payload: &InteractionPayload) -> GateOutcome {
        match payload.decision() {
            Decision::Approve(raw_plan) => self.approve(payload, raw_plan).await,
            Decision::Deny => {
                info!(actor = payload.actor(), "Remediation denied");
                self.update(
                    payload,
                    &format!(
                        ":no_entry_sign: Remediation denied by {}. No action taken.",
                        payload.actor()
                    ),
                )
                .await;
                GateOutcome::Denied
            }
            Decision::Ignored => {
                info!(kind = %payload.kind, "Ignoring interaction");
                GateOutcome::Ignored
            }
        }
    }

    async fn approve(&self, payload: &InteractionPayload, raw_plan: &str) -> GateOutcome {
        let plan: RemediationPlan = match serde_json::from_str(raw_plan) {
            Ok(plan) => plan,
            Err(e) => {
                error!(error = %e, "Approved payload is not a remediation plan");
                self.update(
                    payload,
                    &format!(":x: Could not read the approved remediation plan: {e}"),
                )
                .await;
                return GateOutcome::InvalidPlan;
            }
        };

        info!(
            actor = payload.actor(),
            action = %plan.action,
            target = %plan.target_label(),
            namespace = %plan.namespace,
            "Remediation approved"
        );

        self.update(
            payload,
            &format!(
                ":white_check_mark: Remediation approved by {}. Action `{}` on `{}` sent for execution.",
                payload.actor(),
                plan.action,
                plan.target_label()
            ),
        )
        .await;

        match self.remediation.send(&plan).await {
            Ok(_) => {
                info!(url = self.remediation.url(), action = %plan.action, "Plan handed to remediation");
                GateOutcome::Dispatched(plan)
            }
            Err(e) => {
                error!(error = %e, action = %plan.action, "Failed to hand plan to remediation");
                GateOutcome::DispatchFailed(plan)
            }
        }
    }

    async fn update(&self, payload: &InteractionPayload, text: &str) {
        let Some(response_url) = payload.response_url.as_deref() else {
            warn!("Interaction has no response_url; original message left unchanged");
            return;
        };
        if let Err(e) = self.notifier.update_message(response_url, text).await {
            error!(error = %e, "Failed to update approval message");
        }
    }
}
