//! The remediation plan threaded through every stage of the pipeline.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::text::{head_chars, tail_chars};

/// Wire value for a plan that names no concrete pod.
pub const ABSENT_POD: &str = "N/A";

/// Maximum characters of root-cause narrative carried in a plan.
pub const MAX_ANALYSIS_CHARS: usize = 800;

/// Maximum characters of evidence carried in a plan.
pub const MAX_EVIDENCE_CHARS: usize = 500;

/// Maximum characters of the proposed action's rationale.
pub const MAX_REASON_CHARS: usize = 300;

/// Values producers use to mean "no pod". All of them normalise to [`PodRef::Absent`].
const ABSENT_SPELLINGS: &[&str] = &["", "n/a", "na", "none", "null", "nil", "unknown"];

// =============================================================================
// Actions
// =============================================================================

/// The closed set of remediation actions.
///
/// Anything a producer sends outside the set is kept as [`Self::Unrecognized`]
/// so it can be reported, but it is never executed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemediationAction {
    /// Delete the pod so its controller recreates it.
    RestartTarget,
    /// Raise the deployment's desired replica count by one.
    ScaleTarget,
    /// Dry run: nothing is touched.
    #[default]
    NoAction,
    /// A value outside the closed set.
    Unrecognized(String),
}

impl RemediationAction {
    /// Parse a wire value, accepting the older action names as aliases.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "restart_target" | "restart_pod" => Self::RestartTarget,
            "scale_target" | "scale_deployment" => Self::ScaleTarget,
            "no_action" | "none" => Self::NoAction,
            _ => Self::Unrecognized(value.to_string()),
        }
    }

    /// Canonical wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RestartTarget => "restart_target",
            Self::ScaleTarget => "scale_target",
            Self::NoAction => "no_action",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RemediationAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RemediationAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Self::NoAction, |value| Self::parse(&value)))
    }
}

// =============================================================================
// Pod reference
// =============================================================================

/// Pod component of a target: a concrete pod name or the absent sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PodRef {
    /// No precise pod could be determined.
    #[default]
    Absent,
    /// A concrete pod name.
    Named(String),
}

impl PodRef {
    /// Build from an optional raw value, normalising every "no pod" spelling.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if !ABSENT_SPELLINGS.contains(&value.to_ascii_lowercase().as_str()) => {
                Self::Named(value.to_string())
            }
            _ => Self::Absent,
        }
    }

    /// The pod name, if one is known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Absent => None,
        }
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or(ABSENT_POD))
    }
}

impl Serialize for PodRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name().unwrap_or(ABSENT_POD))
    }
}

impl<'de> Deserialize<'de> for PodRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_raw(raw.as_deref()))
    }
}

// =============================================================================
// Diagnosis report
// =============================================================================

/// Root-cause narrative plus the evidence it was drawn from.
///
/// Produced once per alert and embedded unchanged into every downstream record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    /// Root-cause analysis, at most [`MAX_ANALYSIS_CHARS`] characters
    #[serde(default)]
    pub analysis: String,
    /// Most recent log/state output, at most [`MAX_EVIDENCE_CHARS`] characters
    #[serde(default)]
    pub evidence: String,
}

impl DiagnosisReport {
    /// Build a report, bounding both fields.
    #[must_use]
    pub fn new(analysis: &str, evidence: &str) -> Self {
        Self {
            analysis: head_chars(analysis.trim(), MAX_ANALYSIS_CHARS),
            evidence: tail_chars(evidence.trim(), MAX_EVIDENCE_CHARS),
        }
    }
}

// =============================================================================
// Plan
// =============================================================================

/// The single object threaded through the whole pipeline.
///
/// Fields this crate does not model are kept in [`Self::extra`] and written
/// back out unchanged, so no stage drops what an earlier stage added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemediationPlan {
    /// Action to perform
    #[serde(default)]
    pub action: RemediationAction,
    /// Pod to act on, or the absent sentinel
    #[serde(default)]
    pub pod_name: PodRef,
    /// Scalable group (deployment) to act on
    #[serde(
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub deployment_name: Option<String>,
    /// Namespace of the target
    #[serde(default)]
    pub namespace: String,
    /// Why this action was proposed
    #[serde(default)]
    pub reason: String,
    /// Diagnosis narrative and evidence
    #[serde(default)]
    pub diagnosis_report: DiagnosisReport,
    /// Fields written by producers this crate does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemediationPlan {
    /// Turn the structured section of a reasoning response into a plan.
    ///
    /// Returns `None` when the candidate is empty or does not fit the plan
    /// shape; the caller treats that as "no plan produced". A missing group
    /// name falls back to `default_deployment`, a missing namespace to
    /// `namespace`. The reason is bounded to [`MAX_REASON_CHARS`] and the
    /// diagnosis report is always attached.
    #[must_use]
    pub fn from_candidate(
        candidate: Map<String, Value>,
        report: DiagnosisReport,
        default_deployment: &str,
        namespace: &str,
    ) -> Option<Self> {
        if candidate.is_empty() {
            return None;
        }

        let mut plan: Self = match serde_json::from_value(Value::Object(candidate)) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(error = %e, "Structured plan does not match the plan shape");
                return None;
            }
        };

        if plan.deployment_name.is_none() {
            plan.deployment_name = Some(default_deployment.to_string());
        }
        if plan.namespace.trim().is_empty() {
            plan.namespace = namespace.to_string();
        }
        plan.reason = head_chars(plan.reason.trim(), MAX_REASON_CHARS);
        plan.diagnosis_report = report;
        Some(plan)
    }

    /// The resource name this plan's action operates on.
    ///
    /// `scale_target` always selects the deployment, `restart_target` always
    /// selects the pod; other actions have no target.
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        match self.action {
            RemediationAction::ScaleTarget => self.deployment_name.as_deref(),
            RemediationAction::RestartTarget => self.pod_name.name(),
            RemediationAction::NoAction | RemediationAction::Unrecognized(_) => None,
        }
    }

    /// Human-readable target for channel messages.
    #[must_use]
    pub fn target_label(&self) -> String {
        match self.action {
            RemediationAction::ScaleTarget => format!(
                "deployment/{}",
                self.deployment_name.as_deref().unwrap_or(ABSENT_POD)
            ),
            _ => format!("pod/{}", self.pod_name),
        }
    }
}

fn non_empty_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !ABSENT_SPELLINGS.contains(&s.to_ascii_lowercase().as_str())))
}
