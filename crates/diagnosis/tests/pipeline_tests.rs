//! Diagnosis service tests: alert webhook through approval gate.
//!
//! The router is driven in-process; the cluster and the human channel are
//! in-memory fakes and the remediation service is a wiremock server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cluster::memory::InMemoryControlPlane;
use diagnosis::{
    build_router, AlertOutcome, ApprovalGate, ChatMessage, Diagnoser, DiagnosisSettings,
    ReasoningError, ReasoningService, ServerState,
};
use incident::{AlertBatch, HandoffClient, PodRef, RemediationAction, RemediationPlan};
use notify::testing::RecordingChannel;
use notify::{Notifier, NotifyEvent};

// ============================================================================
// Fixtures
// ============================================================================

struct ScriptedReasoner {
    reply: String,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedReasoner {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            seen: Mutex::new(vec![]),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|messages| messages.last().unwrap().content.clone())
            .collect()
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoner {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReasoningError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        Ok(self.reply.clone())
    }
}

struct Harness {
    app: Router,
    channel: Arc<RecordingChannel>,
    reasoner: Arc<ScriptedReasoner>,
    diagnoser: Arc<Diagnoser>,
}

fn harness(reply: &str, remediation_url: &str) -> Harness {
    let channel = Arc::new(RecordingChannel::new());
    let notifier = Arc::new(Notifier::with_channels(vec![channel.clone()]));
    let reasoner = ScriptedReasoner::new(reply);
    let cluster = InMemoryControlPlane::new().with_logs(
        "web-7f",
        "starting\nBack-off restarting failed container\nCrashLoopBackOff\n",
    );

    let diagnoser = Arc::new(Diagnoser::new(
        Arc::new(cluster),
        reasoner.clone(),
        Arc::clone(&notifier),
        DiagnosisSettings {
            default_deployment: "sample-app".to_string(),
            default_namespace: "default".to_string(),
            log_tail_lines: 20,
        },
    ));
    let gate = Arc::new(ApprovalGate::new(
        notifier,
        HandoffClient::new(remediation_url, Duration::from_secs(2)),
    ));

    let app = build_router(Arc::new(ServerState {
        diagnoser: Arc::clone(&diagnoser),
        gate,
    }));

    Harness {
        app,
        channel,
        reasoner,
        diagnoser,
    }
}

const RESTART_REPLY: &str = "Analysis: The container is crash looping.\nPlan:\n```json\n{\"action\": \"restart_target\", \"pod_name\": \"web-7f\", \"deployment_name\": \"web\", \"namespace\": \"ns1\", \"reason\": \"CrashLoopBackOff\"}\n```";

const SCALE_REPLY: &str = "Analysis: The deployment has no replicas.\nPlan: {\"action\": \"scale_target\", \"pod_name\": \"N/A\", \"deployment_name\": \"web\", \"namespace\": \"ns1\", \"reason\": \"scaled to zero\"}";

fn scenario_a() -> Value {
    json!({
        "status": "firing",
        "alerts": [{
            "labels": {"alertname": "PodDown", "namespace": "ns1", "pod": "web-7f", "app": "web"},
            "annotations": {"summary": "pod down"}
        }]
    })
}

fn scenario_b() -> Value {
    json!({
        "status": "firing",
        "alerts": [{
            "labels": {"alertname": "DeploymentReplicasZero", "namespace": "ns1", "deployment": "web"},
            "annotations": {"summary": "no replicas"}
        }]
    })
}

fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(payload: &Value) -> Request<Body> {
    let encoded: String = payload
        .to_string()
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();

    Request::builder()
        .method("POST")
        .uri("/slack-interactive")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("payload={encoded}")))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Wait for background work to satisfy `check`.
async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

fn approval_plan(event: &NotifyEvent) -> RemediationPlan {
    match event {
        NotifyEvent::ApprovalRequested { request, .. } => {
            serde_json::from_str(&request.plan_payload).unwrap()
        }
        other => panic!("expected approval request, got {other:?}"),
    }
}

fn approval_payload(plan: &RemediationPlan, action_id: &str) -> Value {
    let value = if action_id == "approve_remediation" {
        serde_json::to_string(plan).unwrap()
    } else {
        "denied".to_string()
    };
    json!({
        "type": "block_actions",
        "user": {"id": "U123", "username": "alice"},
        "response_url": "https://hooks.slack.test/actions/1",
        "actions": [{"action_id": action_id, "value": value}]
    })
}

// ============================================================================
// Alert webhook
// ============================================================================

#[tokio::test]
async fn scenario_a_pod_down_requests_restart_approval() {
    let h = harness(RESTART_REPLY, "http://127.0.0.1:9/remediate");

    let response = h
        .app
        .clone()
        .oneshot(json_request("/alert", &scenario_a()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        body_json(response).await,
        json!({"status": "accepted", "alerts": 1})
    );

    let channel = h.channel.clone();
    eventually(move || channel.events().len() == 1).await;

    let prompt = &h.reasoner.prompts()[0];
    assert!(prompt.contains("Pod: web-7f"));
    assert!(prompt.contains("CrashLoopBackOff"));

    let plan = approval_plan(&h.channel.events()[0]);
    assert_eq!(plan.action, RemediationAction::RestartTarget);
    assert_eq!(plan.target_name(), Some("web-7f"));
    assert_eq!(plan.namespace, "ns1");
    assert_eq!(plan.diagnosis_report.analysis, "The container is crash looping.");
    assert!(plan.diagnosis_report.evidence.contains("CrashLoopBackOff"));
}

#[tokio::test]
async fn scenario_b_replicas_zero_requests_scale_approval() {
    let h = harness(SCALE_REPLY, "http://127.0.0.1:9/remediate");
    let batch: AlertBatch = serde_json::from_value(scenario_b()).unwrap();

    let outcomes = h.diagnoser.process_batch(batch).await;

    let [AlertOutcome::ApprovalRequested(plan)] = outcomes.as_slice() else {
        panic!("unexpected outcomes: {outcomes:?}");
    };
    assert_eq!(plan.action, RemediationAction::ScaleTarget);
    assert_eq!(plan.target_name(), Some("web"));
    assert_eq!(plan.pod_name, PodRef::Absent);

    let prompt = &h.reasoner.prompts()[0];
    assert!(prompt.contains("Pod: N/A"));
    assert!(prompt.contains("Deployment: web"));

    let wire = serde_json::to_value(approval_plan(&h.channel.events()[0])).unwrap();
    assert_eq!(wire["pod_name"], "N/A");
    assert_eq!(wire["deployment_name"], "web");
}

#[tokio::test]
async fn non_firing_batch_is_ignored() {
    let h = harness(RESTART_REPLY, "http://127.0.0.1:9/remediate");
    let mut batch = scenario_a();
    batch["status"] = json!("resolved");

    let response = h
        .app
        .clone()
        .oneshot(json_request("/alert", &batch))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ignored"}));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.reasoner.prompts().is_empty());
    assert!(h.channel.events().is_empty());
}

#[tokio::test]
async fn unparseable_plan_posts_nothing() {
    let h = harness("Analysis: unsure\nPlan: restart it maybe", "http://127.0.0.1:9/remediate");
    let batch: AlertBatch = serde_json::from_value(scenario_a()).unwrap();

    let outcomes = h.diagnoser.process_batch(batch).await;

    assert!(matches!(
        outcomes.as_slice(),
        [AlertOutcome::NoPlan { analysis }] if analysis == "unsure"
    ));
    assert!(h.channel.events().is_empty());
}

#[tokio::test]
async fn malformed_alert_body_is_rejected() {
    let h = harness(RESTART_REPLY, "http://127.0.0.1:9/remediate");

    let response = h
        .app
        .oneshot(json_request("/alert", &json!({"alerts": "nope"})))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

// ============================================================================
// Approval gate
// ============================================================================

fn sample_plan() -> RemediationPlan {
    let batch: AlertBatch = serde_json::from_value(scenario_a()).unwrap();
    let alert = &batch.into_events()[0];
    let parsed = incident::parse_reasoning_response(RESTART_REPLY);
    RemediationPlan::from_candidate(
        parsed.candidate,
        incident::DiagnosisReport::new(&parsed.analysis, "CrashLoopBackOff"),
        "sample-app",
        alert.namespace().unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn approve_updates_message_once_and_dispatches_once() {
    let remediation = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/remediate"))
        .and(body_partial_json(json!({
            "action": "restart_target",
            "pod_name": "web-7f",
            "diagnosis_report": {"evidence": "CrashLoopBackOff"}
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "accepted"})))
        .expect(1)
        .mount(&remediation)
        .await;

    let h = harness(RESTART_REPLY, &format!("{}/remediate", remediation.uri()));

    let response = h
        .app
        .clone()
        .oneshot(form_request(&approval_payload(&sample_plan(), "approve_remediation")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..200 {
        if remediation.received_requests().await.unwrap_or_default().len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let updates = h.channel.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "https://hooks.slack.test/actions/1");
    assert!(updates[0].1.contains("approved by alice"));
    remediation.verify().await;
}

#[tokio::test]
async fn deny_never_contacts_remediation() {
    let remediation = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&remediation)
        .await;

    let h = harness(RESTART_REPLY, &format!("{}/remediate", remediation.uri()));

    let response = h
        .app
        .clone()
        .oneshot(form_request(&approval_payload(&sample_plan(), "deny_remediation")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let channel = h.channel.clone();
    eventually(move || channel.updates().len() == 1).await;
    assert!(h.channel.updates()[0].1.contains("denied"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    remediation.verify().await;
}

#[tokio::test]
async fn approve_with_unreachable_remediation_still_acknowledges() {
    let h = harness(RESTART_REPLY, "http://127.0.0.1:9/remediate");

    let response = h
        .app
        .clone()
        .oneshot(form_request(&approval_payload(&sample_plan(), "approve_remediation")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let channel = h.channel.clone();
    eventually(move || channel.updates().len() == 1).await;
}

#[tokio::test]
async fn malformed_interaction_payload_is_rejected() {
    let h = harness(RESTART_REPLY, "http://127.0.0.1:9/remediate");

    let request = Request::builder()
        .method("POST")
        .uri("/slack-interactive")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("payload=not-json"))
        .unwrap();

    let response = h.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.channel.updates().is_empty());
}

#[tokio::test]
async fn health_reports_healthy() {
    let h = harness(RESTART_REPLY, "http://127.0.0.1:9/remediate");

    let response = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}
