//! The terminal artifact of the pipeline.

use serde::{Deserialize, Serialize};

use crate::result::RemediationResult;
use crate::text::{head_chars, tail_lines};

/// Evidence lines kept in the final report.
pub const REPORT_EVIDENCE_LINES: usize = 5;

/// Narrative characters kept in the final report.
pub const REPORT_ANALYSIS_CHARS: usize = 500;

/// What post-action inspection of the cluster found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The expected post-condition was observed.
    Confirmed(String),
    /// The deadline elapsed first; carries the last observation.
    TimedOut(String),
    /// Inspecting the cluster failed.
    Failed(String),
    /// The action has no post-condition to check.
    NotApplicable(String),
    /// Remediation did not succeed, so nothing was inspected.
    Skipped,
}

impl VerificationOutcome {
    /// Text for the report's verification section.
    #[must_use]
    pub fn details(&self) -> String {
        match self {
            Self::Confirmed(details) | Self::NotApplicable(details) => details.clone(),
            Self::TimedOut(last) => format!("Verification timed out. Last observed: {last}"),
            Self::Failed(error) => format!("Verification failed: {error}"),
            Self::Skipped => "Not verified: remediation did not succeed.".to_string(),
        }
    }
}

/// Headline classification of a finished incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Action applied and confirmed
    Verified,
    /// Action applied, post-condition not observed before the deadline
    Unconfirmed,
    /// Action applied, but the cluster could not be inspected
    VerificationFailed,
    /// The action itself failed
    RemediationFailed,
    /// Action applied, nothing to verify
    Completed,
}

impl ReportStatus {
    /// Slack emoji for this status.
    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Verified => ":white_check_mark:",
            Self::Unconfirmed => ":hourglass:",
            Self::VerificationFailed => ":warning:",
            Self::RemediationFailed => ":x:",
            Self::Completed => ":information_source:",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Verified => "Verified",
            Self::Unconfirmed => "Verification Timed Out",
            Self::VerificationFailed => "Verification Failed",
            Self::RemediationFailed => "Remediation Failed",
            Self::Completed => "Completed",
        }
    }

    /// Whether the remediation itself succeeded.
    #[must_use]
    pub const fn remediation_succeeded(&self) -> bool {
        !matches!(self, Self::RemediationFailed)
    }
}

/// Consolidated diagnosis + execution + verification evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub status: ReportStatus,
    pub action: String,
    pub namespace: String,
    pub target: String,
    /// Root-cause narrative from the diagnosis report
    pub analysis: String,
    /// Last lines of the diagnosis evidence
    pub evidence: String,
    /// Message from the remediation result
    pub message: String,
    pub verification_details: String,
}

impl VerificationReport {
    /// Combine a remediation result with what verification observed.
    #[must_use]
    pub fn compose(result: &RemediationResult, outcome: &VerificationOutcome) -> Self {
        let status = if result.is_success() {
            match outcome {
                VerificationOutcome::Confirmed(_) => ReportStatus::Verified,
                VerificationOutcome::TimedOut(_) => ReportStatus::Unconfirmed,
                VerificationOutcome::Failed(_) => ReportStatus::VerificationFailed,
                VerificationOutcome::NotApplicable(_) | VerificationOutcome::Skipped => {
                    ReportStatus::Completed
                }
            }
        } else {
            ReportStatus::RemediationFailed
        };

        let plan = &result.plan;
        let namespace = if plan.namespace.is_empty() {
            "N/A".to_string()
        } else {
            plan.namespace.clone()
        };

        Self {
            status,
            action: plan.action.to_string(),
            namespace,
            target: plan.target_label(),
            analysis: head_chars(&plan.diagnosis_report.analysis, REPORT_ANALYSIS_CHARS),
            evidence: tail_lines(&plan.diagnosis_report.evidence, REPORT_EVIDENCE_LINES),
            message: result.message.clone(),
            verification_details: outcome.details(),
        }
    }

    /// Headline naming the action.
    #[must_use]
    pub fn title(&self) -> String {
        if self.status.remediation_succeeded() {
            format!("Remediation Successful: `{}` ({})", self.action, self.status.label())
        } else {
            format!("Remediation Failed: `{}`", self.action)
        }
    }
}
