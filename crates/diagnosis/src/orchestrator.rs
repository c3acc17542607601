//! Diagnosis orchestrator: alert batch in, approval requests out.

use std::sync::Arc;

use cluster::ControlPlane;
use incident::{
    infer_target, parse_reasoning_response, AlertBatch, AlertEvent, DiagnosisReport,
    ParsedResponse, PodRef, RemediationPlan,
};
use notify::{ApprovalRequest, NotifyEvent, Notifier};
use serde_json::Map;
use tracing::{error, info, warn};

use crate::evidence::gather_evidence;
use crate::prompt::build_messages;
use crate::reasoning::ReasoningService;

/// Deployment-level defaults applied during diagnosis.
#[derive(Debug, Clone)]
pub struct DiagnosisSettings {
    /// Group name used when a plan names none
    pub default_deployment: String,
    /// Namespace used when an alert carries none
    pub default_namespace: String,
    /// Log lines collected as evidence
    pub log_tail_lines: i64,
}

/// What happened to a single alert.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutcome {
    /// A plan was produced and the approval request was posted.
    ApprovalRequested(RemediationPlan),
    /// A plan was produced but the approval request could not be posted.
    ApprovalNotDelivered(RemediationPlan),
    /// The reasoning service produced no usable plan.
    NoPlan { analysis: String },
}

/// Runs diagnosis for each alert and posts approval requests.
pub struct Diagnoser {
    cluster: Arc<dyn ControlPlane>,
    reasoner: Arc<dyn ReasoningService>,
    notifier: Arc<Notifier>,
    settings: DiagnosisSettings,
}

impl Diagnoser {
    pub fn new(
        cluster: Arc<dyn ControlPlane>,
        reasoner: Arc<dyn ReasoningService>,
        notifier: Arc<Notifier>,
        settings: DiagnosisSettings,
    ) -> Self {
        Self {
            cluster,
            reasoner,
            notifier,
            settings,
        }
    }

    /// Process every alert of a firing batch, one at a time in arrival order.
    ///
    /// Non-firing batches are ignored. Each alert is handled independently;
    /// one alert's outcome never stops the rest of the batch.
    pub async fn process_batch(&self, batch: AlertBatch) -> Vec<AlertOutcome> {
        if !batch.is_firing() {
            info!(status = %batch.status, "Ignoring non-firing alert batch");
            return vec![];
        }

        let alerts = batch.into_events();
        info!(count = alerts.len(), "Processing firing alert batch");

        let mut outcomes = Vec::with_capacity(alerts.len());
        for alert in &alerts {
            outcomes.push(self.handle_alert(alert).await);
        }
        outcomes
    }

    /// Diagnose one alert and, if a plan results, request approval for it.
    pub async fn handle_alert(&self, alert: &AlertEvent) -> AlertOutcome {
        let (analysis, plan) = self.diagnose(alert).await;

        let Some(plan) = plan else {
            warn!(alert = alert.name(), "No remediation plan generated");
            return AlertOutcome::NoPlan { analysis };
        };

        if self.request_approval(alert, &plan).await {
            AlertOutcome::ApprovalRequested(plan)
        } else {
            AlertOutcome::ApprovalNotDelivered(plan)
        }
    }

    /// Gather evidence, ask the reasoning service, and parse its answer.
    ///
    /// Returns the analysis text and the plan, if one could be parsed. The
    /// analysis is an error description when the reasoning call failed.
    ///
    /// A plan never names a pod the alert did not: when the alert carries no
    /// pod label the plan's pod is the absent sentinel, whatever the
    /// reasoning service answered.
    pub async fn diagnose(&self, alert: &AlertEvent) -> (String, Option<RemediationPlan>) {
        let target = infer_target(alert);
        let namespace = alert
            .namespace()
            .unwrap_or(&self.settings.default_namespace)
            .to_string();

        info!(
            alert = alert.name(),
            pod = %target.pod,
            deployment = target.group.as_deref().unwrap_or_default(),
            namespace = %namespace,
            "Diagnosing alert"
        );

        let evidence = gather_evidence(
            self.cluster.as_ref(),
            &namespace,
            &target.pod,
            self.settings.log_tail_lines,
        )
        .await;

        let messages = build_messages(alert, &target, &namespace, &evidence);
        let ParsedResponse {
            analysis,
            candidate,
        } = match self.reasoner.complete(&messages).await {
            Ok(content) => parse_reasoning_response(&content),
            Err(e) => {
                error!(alert = alert.name(), reasoner = self.reasoner.name(), error = %e, "Reasoning request failed");
                ParsedResponse {
                    analysis: format!("Error during analysis: {e}"),
                    candidate: Map::new(),
                }
            }
        };

        let report = DiagnosisReport::new(&analysis, &evidence);
        let plan = RemediationPlan::from_candidate(
            candidate,
            report,
            &self.settings.default_deployment,
            &namespace,
        )
        .map(|mut plan| {
            if target.pod.is_absent() && !plan.pod_name.is_absent() {
                warn!(
                    alert = alert.name(),
                    pod = %plan.pod_name,
                    "Discarding pod the alert does not name"
                );
                plan.pod_name = PodRef::Absent;
            }
            plan
        });

        (analysis, plan)
    }

    /// Post the approval request once. Failures are logged, never retried.
    async fn request_approval(&self, alert: &AlertEvent, plan: &RemediationPlan) -> bool {
        let request = match ApprovalRequest::new(alert, plan) {
            Ok(request) => request,
            Err(e) => {
                error!(alert = alert.name(), error = %e, "Failed to build approval request");
                return false;
            }
        };

        let delivered = self.notifier.deliver(NotifyEvent::approval(request)).await;
        if delivered {
            info!(
                alert = alert.name(),
                action = %plan.action,
                target = %plan.target_label(),
                "Approval requested"
            );
        } else {
            warn!(alert = alert.name(), "Approval request was not delivered");
        }
        delivered
    }
}
