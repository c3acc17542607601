//! Action table execution.
//!
//! Exactly one of the closed set of actions runs per plan. Every outcome,
//! including a rejected plan or a failed cluster call, becomes a
//! [`RemediationResult`] that is reported to verification exactly once.

use std::sync::Arc;

use cluster::{ClusterError, ControlPlane};
use incident::{HandoffClient, RemediationAction, RemediationPlan, RemediationResult};
use tracing::{error, info, warn};

/// Runs plans and reports their results.
pub struct Executor {
    cluster: Arc<dyn ControlPlane>,
    reflection: HandoffClient,
}

impl Executor {
    #[must_use]
    pub fn new(cluster: Arc<dyn ControlPlane>, reflection: HandoffClient) -> Self {
        Self {
            cluster,
            reflection,
        }
    }

    /// Execute `plan` and hand the result to verification.
    pub async fn run(&self, plan: RemediationPlan) -> RemediationResult {
        let result = self.execute(plan).await;

        info!(
            action = %result.plan.action,
            status = result.status.as_str(),
            message = %result.message,
            "Remediation finished"
        );

        if let Err(e) = self.reflection.send(&result).await {
            error!(error = %e, "Failed to report remediation result");
        }
        result
    }

    /// Execute `plan` without reporting.
    pub async fn execute(&self, plan: RemediationPlan) -> RemediationResult {
        info!(
            action = %plan.action,
            target = %plan.target_label(),
            namespace = %plan.namespace,
            reason = %plan.reason,
            "Executing remediation plan"
        );

        match plan.action.clone() {
            RemediationAction::NoAction => {
                RemediationResult::success(plan, "Action 'no_action' requested. No remediation performed.")
            }
            RemediationAction::Unrecognized(raw) => {
                warn!(action = %raw, "Refusing to execute unknown action");
                RemediationResult::failure(plan, format!("Unknown action: {raw}"))
            }
            action @ (RemediationAction::RestartTarget | RemediationAction::ScaleTarget) => {
                let Some(target) = plan.target_name().map(ToString::to_string) else {
                    let field = if action == RemediationAction::ScaleTarget {
                        "deployment_name"
                    } else {
                        "pod_name"
                    };
                    return RemediationResult::failure(
                        plan,
                        format!("Missing '{field}' for {action} action."),
                    );
                };
                if plan.namespace.trim().is_empty() {
                    return RemediationResult::failure(
                        plan,
                        format!("Missing 'namespace' for {action} action."),
                    );
                }

                let outcome = if action == RemediationAction::ScaleTarget {
                    self.scale_up(&plan.namespace, &target).await
                } else {
                    self.restart(&plan.namespace, &target).await
                };

                match outcome {
                    Ok(message) => RemediationResult::success(plan, message),
                    Err(e) => {
                        error!(action = %action, target = %target, error = %e, "Remediation action failed");
                        RemediationResult::failure(plan, e.to_string())
                    }
                }
            }
        }
    }

    async fn restart(&self, namespace: &str, pod: &str) -> Result<String, ClusterError> {
        self.cluster.delete_pod(namespace, pod).await?;
        Ok(format!("Deleted pod {pod} in {namespace} to trigger restart."))
    }

    async fn scale_up(&self, namespace: &str, deployment: &str) -> Result<String, ClusterError> {
        let before = self
            .cluster
            .desired_replicas(namespace, deployment)
            .await?
            .unwrap_or(0);
        let after = before.checked_add(1).ok_or_else(|| {
            ClusterError::Other(format!("deployment {deployment} is already at the replica limit"))
        })?;

        self.cluster
            .set_desired_replicas(namespace, deployment, after)
            .await?;
        Ok(format!(
            "Scaled deployment {deployment} in {namespace} from {before} to {after} replicas."
        ))
    }
}
