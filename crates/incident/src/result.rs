//! Outcome of executing a remediation plan.

use serde::{Deserialize, Serialize};

use crate::plan::RemediationPlan;

/// Whether the managed action completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationStatus {
    /// The action (or the no-op) completed
    Success,
    /// The action was rejected or the control plane call failed
    Failure,
}

impl RemediationStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Produced exactly once per executed plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationResult {
    /// The originating plan, unmodified
    #[serde(rename = "remediation_plan", alias = "plan", default)]
    pub plan: RemediationPlan,
    /// Outcome
    pub status: RemediationStatus,
    /// What happened, or the error text
    #[serde(default)]
    pub message: String,
}

impl RemediationResult {
    #[must_use]
    pub fn success(plan: RemediationPlan, message: impl Into<String>) -> Self {
        Self {
            plan,
            status: RemediationStatus::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(plan: RemediationPlan, message: impl Into<String>) -> Self {
        Self {
            plan,
            status: RemediationStatus::Failure,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RemediationStatus::Success
    }
}
