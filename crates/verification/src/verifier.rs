//! Post-remediation verification and the consolidated report.

use std::sync::Arc;
use std::time::Duration;

use cluster::{newest_pod, ClusterError, ControlPlane};
use incident::{
    RemediationAction, RemediationPlan, RemediationResult, VerificationOutcome,
    VerificationReport,
};
use notify::{Notifier, NotifyEvent};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::poll::{poll_until, Backoff, Probe};

/// Pod phase a recreated pod must reach.
const RUNNING: &str = "Running";

/// Timing and selection settings for verification.
#[derive(Debug, Clone)]
pub struct VerifySettings {
    /// Grace period before the first inspection
    pub settle_delay: Duration,
    /// How long to keep polling after the grace period
    pub deadline: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Pod label whose value is the workload name
    pub workload_label_key: String,
}

/// Verifies remediation results and publishes the final report.
pub struct Verifier {
    cluster: Arc<dyn ControlPlane>,
    notifier: Arc<Notifier>,
    settings: VerifySettings,
}

impl Verifier {
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ControlPlane>,
        notifier: Arc<Notifier>,
        settings: VerifySettings,
    ) -> Self {
        Self {
            cluster,
            notifier,
            settings,
        }
    }

    /// Verify `result`, then publish one consolidated report.
    pub async fn run(&self, result: RemediationResult) -> VerificationReport {
        let outcome = self.verify(&result).await;
        let report = VerificationReport::compose(&result, &outcome);

        info!(
            action = %report.action,
            status = report.status.label(),
            target = %report.target,
            "Publishing incident report"
        );

        if !self.notifier.deliver(NotifyEvent::report(report.clone())).await {
            warn!(action = %report.action, "Incident report was not delivered");
        }
        report
    }

    /// Inspect the cluster for the post-condition of the executed action.
    ///
    /// Failed remediations are not inspected at all.
    pub async fn verify(&self, result: &RemediationResult) -> VerificationOutcome {
        if !result.is_success() {
            info!(action = %result.plan.action, message = %result.message, "Remediation failed; skipping verification");
            return VerificationOutcome::Skipped;
        }

        let plan = &result.plan;
        if matches!(
            plan.action,
            RemediationAction::NoAction | RemediationAction::Unrecognized(_)
        ) {
            return VerificationOutcome::NotApplicable(
                "No action was taken; nothing to verify.".to_string(),
            );
        }

        info!(
            action = %plan.action,
            settle_secs = self.settings.settle_delay.as_secs(),
            "Waiting for the cluster to settle"
        );
        sleep(self.settings.settle_delay).await;

        let outcome = match plan.action {
            RemediationAction::RestartTarget => self.verify_restart(plan).await,
            _ => self.verify_scale(plan).await,
        };

        info!(action = %plan.action, details = %outcome.details(), "Verification finished");
        outcome
    }

    async fn verify_restart(&self, plan: &RemediationPlan) -> VerificationOutcome {
        let Some(group) = plan.deployment_name.as_deref() else {
            return VerificationOutcome::Failed(
                "plan names no workload to select replacement pods by".to_string(),
            );
        };

        let cluster = self.cluster.as_ref();
        let namespace = plan.namespace.as_str();
        let selector = format!("{}={group}", self.settings.workload_label_key);
        let selector = selector.as_str();
        let deleted = plan.pod_name.name();

        poll_until(self.settings.deadline, self.backoff(), move || {
            probe_restart(cluster, namespace, selector, deleted)
        })
        .await
    }

    async fn verify_scale(&self, plan: &RemediationPlan) -> VerificationOutcome {
        let Some(deployment) = plan.deployment_name.as_deref() else {
            return VerificationOutcome::Failed("plan names no deployment".to_string());
        };

        let cluster = self.cluster.as_ref();
        let namespace = plan.namespace.as_str();

        poll_until(self.settings.deadline, self.backoff(), move || {
            probe_scale(cluster, namespace, deployment)
        })
        .await
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(self.settings.initial_backoff, self.settings.max_backoff)
    }
}

/// The newest matching pod must be a replacement and be running.
async fn probe_restart(
    cluster: &dyn ControlPlane,
    namespace: &str,
    selector: &str,
    deleted: Option<&str>,
) -> Result<Probe, ClusterError> {
    let pods = cluster.list_pods(namespace, selector).await?;

    let Some(pod) = newest_pod(&pods) else {
        return Ok(Probe::Pending(format!(
            "No pods found matching {selector} in {namespace}"
        )));
    };

    let observed = format!("Newest pod {} is {}", pod.name, pod.phase);
    if Some(pod.name.as_str()) != deleted && pod.phase == RUNNING {
        Ok(Probe::Done(observed))
    } else {
        Ok(Probe::Pending(observed))
    }
}

/// Ready replicas must reach the desired count.
async fn probe_scale(
    cluster: &dyn ControlPlane,
    namespace: &str,
    deployment: &str,
) -> Result<Probe, ClusterError> {
    let status = cluster.replica_status(namespace, deployment).await?;
    // An unset spec.replicas defaults to one.
    let desired = status.desired.unwrap_or(1);

    let observed = format!(
        "Deployment {deployment} has {}/{desired} ready replicas",
        status.ready
    );
    if status.ready >= desired {
        Ok(Probe::Done(observed))
    } else {
        Ok(Probe::Pending(observed))
    }
}
