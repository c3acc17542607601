//! Events posted to the human channel.

use chrono::{DateTime, Utc};
use incident::text::{head_chars, tail_chars};
use incident::{AlertEvent, RemediationPlan, ReportStatus, VerificationReport};
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Evidence characters shown in an approval request.
pub const APPROVAL_EVIDENCE_CHARS: usize = 300;

/// Longest value Slack accepts on an interactive button.
pub const MAX_PLAN_PAYLOAD_CHARS: usize = 2000;

/// Severity levels for channel messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - normal operations
    Info,
    /// Warning - something needs attention
    Warning,
    /// Critical - immediate action required
    Critical,
}

impl Severity {
    /// Attachment colour for this severity.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Info => "#36a64f",     // Green
            Self::Warning => "#f39c12",  // Orange
            Self::Critical => "#e74c3c", // Red
        }
    }
}

/// Everything a human needs to approve or deny a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub alert_name: String,
    pub summary: String,
    pub namespace: String,
    /// Display form of the action's target, e.g. `pod/web-7f`
    pub target: String,
    pub action: String,
    pub reason: String,
    pub analysis: String,
    /// Truncated evidence excerpt
    pub evidence: String,
    /// The serialized plan, returned verbatim in the approval callback
    pub plan_payload: String,
}

impl ApprovalRequest {
    /// Build the request for `plan`, serializing the plan as the callback payload.
    ///
    /// The payload must fit in [`MAX_PLAN_PAYLOAD_CHARS`]. Evidence and then
    /// analysis in the embedded diagnosis report are shortened until it does;
    /// a plan that still does not fit is rejected.
    pub fn new(alert: &AlertEvent, plan: &RemediationPlan) -> Result<Self, ChannelError> {
        Ok(Self {
            alert_name: alert.name().to_string(),
            summary: alert.summary().to_string(),
            namespace: plan.namespace.clone(),
            target: plan.target_label(),
            action: plan.action.to_string(),
            reason: plan.reason.clone(),
            analysis: plan.diagnosis_report.analysis.clone(),
            evidence: tail_chars(&plan.diagnosis_report.evidence, APPROVAL_EVIDENCE_CHARS),
            plan_payload: plan_payload(plan)?,
        })
    }
}

fn plan_payload(plan: &RemediationPlan) -> Result<String, ChannelError> {
    let mut compact = plan.clone();
    loop {
        let payload = serde_json::to_string(&compact)?;
        let chars = payload.chars().count();
        if chars <= MAX_PLAN_PAYLOAD_CHARS {
            return Ok(payload);
        }

        // Each dropped source character removes at least one payload character.
        let excess = chars - MAX_PLAN_PAYLOAD_CHARS;
        let report = &mut compact.diagnosis_report;
        if !report.evidence.is_empty() {
            let keep = report.evidence.chars().count().saturating_sub(excess);
            report.evidence = tail_chars(&report.evidence, keep);
        } else if !report.analysis.is_empty() {
            let keep = report.analysis.chars().count().saturating_sub(excess);
            report.analysis = head_chars(&report.analysis, keep);
        } else {
            return Err(ChannelError::PayloadTooLarge {
                chars,
                max: MAX_PLAN_PAYLOAD_CHARS,
            });
        }
    }
}

/// Events that can be posted to the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// A diagnosed alert awaiting a human decision
    ApprovalRequested {
        request: ApprovalRequest,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// The consolidated outcome of a remediation
    IncidentReport {
        report: VerificationReport,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Approval request stamped now.
    #[must_use]
    pub fn approval(request: ApprovalRequest) -> Self {
        Self::ApprovalRequested {
            request,
            timestamp: Utc::now(),
        }
    }

    /// Final report stamped now.
    #[must_use]
    pub fn report(report: VerificationReport) -> Self {
        Self::IncidentReport {
            report,
            timestamp: Utc::now(),
        }
    }

    /// Get the title for this event.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::ApprovalRequested { request, .. } => format!("New Alert: {}", request.alert_name),
            Self::IncidentReport { report, .. } => report.title(),
        }
    }

    /// Get the severity for this event.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::ApprovalRequested { .. } => Severity::Warning,
            Self::IncidentReport { report, .. } => match report.status {
                ReportStatus::Verified | ReportStatus::Completed => Severity::Info,
                ReportStatus::Unconfirmed | ReportStatus::VerificationFailed => Severity::Warning,
                ReportStatus::RemediationFailed => Severity::Critical,
            },
        }
    }

    /// Get the timestamp for this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ApprovalRequested { timestamp, .. } | Self::IncidentReport { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use incident::{DiagnosisReport, PodRef, RemediationAction};
    use serde_json::{json, Value};

    fn alert() -> AlertEvent {
        let mut alert = AlertEvent::default();
        alert.labels.insert("alertname".to_string(), "PodDown".to_string());
        alert
    }

    fn plan(analysis: &str, evidence: &str) -> RemediationPlan {
        RemediationPlan {
            action: RemediationAction::RestartTarget,
            pod_name: PodRef::Named("web-7f".to_string()),
            deployment_name: Some("web".to_string()),
            namespace: "ns1".to_string(),
            reason: "r".repeat(300),
            diagnosis_report: DiagnosisReport::new(analysis, evidence),
            ..RemediationPlan::default()
        }
    }

    #[test]
    fn test_small_plan_is_carried_verbatim() {
        let plan = plan("crash loop", "CrashLoopBackOff");
        let request = ApprovalRequest::new(&alert(), &plan).unwrap();

        let decoded: RemediationPlan = serde_json::from_str(&request.plan_payload).unwrap();
        assert_eq!(decoded, plan);
    }

    #[test]
    fn test_heavily_escaped_diagnosis_is_shortened_to_fit() {
        // Quotes and backslashes double in size once JSON-escaped.
        let plan = plan(&"\"".repeat(800), &"\\".repeat(500));
        let request = ApprovalRequest::new(&alert(), &plan).unwrap();

        assert!(request.plan_payload.chars().count() <= MAX_PLAN_PAYLOAD_CHARS);
        let decoded: RemediationPlan = serde_json::from_str(&request.plan_payload).unwrap();
        assert_eq!(decoded.action, RemediationAction::RestartTarget);
        assert_eq!(decoded.pod_name, plan.pod_name);
        assert_eq!(decoded.reason, plan.reason);
        assert!(decoded.diagnosis_report.evidence.len() < plan.diagnosis_report.evidence.len());
        // The message shown to people keeps the full analysis.
        assert_eq!(request.analysis, plan.diagnosis_report.analysis);
    }

    #[test]
    fn test_oversized_extra_fields_are_rejected() {
        let mut plan = plan("a", "b");
        plan.extra.insert("ticket".to_string(), Value::String("t".repeat(3000)));

        let err = ApprovalRequest::new(&alert(), &plan).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::PayloadTooLarge { max: MAX_PLAN_PAYLOAD_CHARS, .. }
        ));
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = NotifyEvent::approval(ApprovalRequest::new(&alert(), &plan("a", "b")).unwrap());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("approval_requested"));
        assert_eq!(value["request"]["alert_name"], json!("PodDown"));
    }
}
