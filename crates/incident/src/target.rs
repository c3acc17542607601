//! Recover the remediation target from inconsistent alert label sets.

use crate::alert::AlertEvent;
use crate::plan::PodRef;

/// Label carrying a concrete pod name.
pub const POD_LABEL: &str = "pod";

/// Labels that may name the scalable group, highest priority first.
pub const GROUP_LABELS: &[&str] = &["deployment", "deploymentconfig", "app", "instance", "service"];

/// The `(pod_or_absent, group_or_absent)` pair passed to evidence gathering
/// and to the reasoning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredTarget {
    pub pod: PodRef,
    pub group: Option<String>,
}

/// Apply the fixed label precedence to an alert.
///
/// The pod comes only from the `pod` label; without it the pod is
/// [`PodRef::Absent`]. The group is the first non-empty label of
/// [`GROUP_LABELS`].
#[must_use]
pub fn infer_target(alert: &AlertEvent) -> InferredTarget {
    let pod = PodRef::from_raw(alert.label(POD_LABEL));
    let group = GROUP_LABELS
        .iter()
        .find_map(|key| alert.label(key))
        .map(ToString::to_string);

    InferredTarget { pod, group }
}
