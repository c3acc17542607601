//! Evidence gathering. Never fails: errors become a placeholder string.

use cluster::ControlPlane;
use incident::PodRef;
use tracing::{debug, warn};

/// Placeholder when there is no pod to read logs from.
pub const NO_POD_EVIDENCE: &str = "No pod-level target identified; no logs collected.";

/// Tail of the pod's log, or a placeholder explaining why there is none.
pub async fn gather_evidence(
    cluster: &dyn ControlPlane,
    namespace: &str,
    pod: &PodRef,
    lines: i64,
) -> String {
    let Some(pod) = pod.name() else {
        debug!(namespace, "No pod to collect logs from");
        return NO_POD_EVIDENCE.to_string();
    };

    match cluster.tail_pod_logs(namespace, pod, lines).await {
        Ok(logs) if logs.trim().is_empty() => format!("Pod {pod} produced no recent log output."),
        Ok(logs) => logs,
        Err(e) => {
            warn!(pod, namespace, error = %e, "Could not fetch pod logs");
            format!("Logs unavailable for pod {pod}: {e}")
        }
    }
}
