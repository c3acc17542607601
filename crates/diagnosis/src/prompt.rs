//! Reasoning request construction.

use incident::parse::{ANALYSIS_MARKER, PLAN_MARKER};
use incident::{AlertEvent, InferredTarget, ABSENT_POD};

use crate::reasoning::ChatMessage;

const SYSTEM_PROMPT: &str = "You are an expert Kubernetes SRE and diagnostics assistant.";

/// Messages asking for a root-cause analysis and a remediation plan.
#[must_use]
pub fn build_messages(
    alert: &AlertEvent,
    target: &InferredTarget,
    namespace: &str,
    evidence: &str,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_prompt(alert, target, namespace, evidence)),
    ]
}

fn user_prompt(
    alert: &AlertEvent,
    target: &InferredTarget,
    namespace: &str,
    evidence: &str,
) -> String {
    let alert_name = alert.name();
    let pod = target.pod.to_string();
    let deployment = target.group.as_deref().unwrap_or(ABSENT_POD);
    let summary = alert.summary();

    format!(
        r#"Analyze the following Prometheus alert and provide a brief root cause analysis
and a JSON-formatted remediation plan for a Kubernetes cluster.

Alert: {alert_name}
Pod: {pod}
Deployment: {deployment}
Namespace: {namespace}
Summary: {summary}

Recent logs:
{evidence}

Choose exactly one action. Apply these rules in order; the first that matches wins:
1. If Pod is "{ABSENT_POD}" or equals the Deployment name exactly, the workload is scaled
   to zero: the action must be "scale_target".
2. If the alert name indicates zero replicas (for example DeploymentReplicasZero),
   the action must be "scale_target".
3. If a concrete Pod is named and either the logs show failure signatures
   (CrashLoopBackOff, OOMKilled, Error, panic, exceptions) or the alert name indicates
   the pod is down (for example PodDown, PodNotReady), the action must be "restart_target".
4. Otherwise the action is "no_action".

Use "{ABSENT_POD}" for pod_name when no concrete pod is known. Never use null.

Example remediation JSON:
{{
  "action": "restart_target",
  "pod_name": "{pod}",
  "deployment_name": "{deployment}",
  "namespace": "{namespace}",
  "reason": "Pod is in a crash loop and requires a restart."
}}

Provide only the root cause analysis and the JSON plan.
Start the analysis with "{ANALYSIS_MARKER}" and the JSON with "{PLAN_MARKER}"."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::ChatRole;
    use incident::infer_target;

    fn alert(labels: &[(&str, &str)]) -> AlertEvent {
        AlertEvent {
            labels: labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..AlertEvent::default()
        }
    }

    #[test]
    fn test_prompt_embeds_alert_and_target() {
        let alert = alert(&[
            ("alertname", "PodDown"),
            ("namespace", "ns1"),
            ("pod", "web-7f"),
            ("app", "web"),
        ]);
        let target = infer_target(&alert);
        let messages = build_messages(&alert, &target, "ns1", "CrashLoopBackOff");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        let prompt = &messages[1].content;
        assert!(prompt.contains("Alert: PodDown"));
        assert!(prompt.contains("Pod: web-7f"));
        assert!(prompt.contains("Deployment: web"));
        assert!(prompt.contains("Namespace: ns1"));
        assert!(prompt.contains("CrashLoopBackOff"));
    }

    #[test]
    fn test_prompt_uses_sentinel_and_markers() {
        let alert = alert(&[("alertname", "DeploymentReplicasZero"), ("deployment", "web")]);
        let target = infer_target(&alert);
        let prompt = &build_messages(&alert, &target, "ns1", "")[1].content;

        assert!(prompt.contains("Pod: N/A"));
        assert!(prompt.contains("\"pod_name\": \"N/A\""));
        assert!(prompt.contains("Start the analysis with \"Analysis:\""));
        assert!(prompt.contains("the JSON with \"Plan:\""));
    }

    #[test]
    fn test_decision_rules_are_ordered() {
        let alert = alert(&[("alertname", "PodDown"), ("pod", "web-7f")]);
        let prompt = &build_messages(&alert, &infer_target(&alert), "ns1", "")[1].content;

        let scale = prompt.find("1. If Pod is").unwrap();
        let zero = prompt.find("2. If the alert name indicates zero replicas").unwrap();
        let restart = prompt.find("3. If a concrete Pod is named").unwrap();
        assert!(scale < zero && zero < restart);
    }
}
