//! Remediation service tests: plan endpoint through result hand-off.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cluster::memory::{Call, InMemoryControlPlane, Operation};
use incident::HandoffClient;
use remediation::{build_router, Executor, ServerState};

async fn reflection_server(expected: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .and(body_partial_json(expected))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "accepted"})))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn executor(cluster: Arc<InMemoryControlPlane>, reflection: &MockServer) -> Executor {
    Executor::new(
        cluster,
        HandoffClient::new(format!("{}/log", reflection.uri()), Duration::from_secs(2)),
    )
}

fn restart_plan() -> Value {
    json!({
        "action": "restart_target",
        "pod_name": "web-7f",
        "deployment_name": "web",
        "namespace": "ns1",
        "reason": "CrashLoopBackOff",
        "diagnosis_report": {"analysis": "crash loop", "evidence": "CrashLoopBackOff"},
        "ticket": "INC-1"
    })
}

async fn wait_for_requests(server: &MockServer, count: usize) {
    for _ in 0..200 {
        if server.received_requests().await.unwrap_or_default().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} hand-off(s)");
}

#[tokio::test]
async fn remediate_acknowledges_then_reports_once() {
    let reflection = reflection_server(json!({
        "status": "success",
        "message": "Deleted pod web-7f in ns1 to trigger restart.",
        "remediation_plan": {
            "pod_name": "web-7f",
            "ticket": "INC-1",
            "diagnosis_report": {"analysis": "crash loop"}
        }
    }))
    .await;
    let cluster = Arc::new(InMemoryControlPlane::new());
    let app = build_router(Arc::new(ServerState {
        executor: Arc::new(executor(cluster.clone(), &reflection)),
    }));

    let response = app
        .oneshot(
            Request::post("/remediate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(restart_plan().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!({"status": "accepted"})
    );

    wait_for_requests(&reflection, 1).await;
    assert_eq!(
        cluster.calls(),
        vec![Call::DeletePod {
            namespace: "ns1".to_string(),
            pod: "web-7f".to_string(),
        }]
    );
    reflection.verify().await;
}

#[tokio::test]
async fn failed_delete_is_still_reported_once() {
    let reflection = reflection_server(json!({
        "status": "failure",
        "message": "connection refused"
    }))
    .await;
    let cluster = Arc::new(
        InMemoryControlPlane::new().failing(Operation::DeletePod, "connection refused"),
    );

    let plan = serde_json::from_value(restart_plan()).unwrap();
    let result = executor(cluster.clone(), &reflection).run(plan).await;

    assert!(!result.is_success());
    assert_eq!(cluster.calls().len(), 1);
    reflection.verify().await;
}

#[tokio::test]
async fn legacy_scale_alias_scales_group() {
    let reflection = reflection_server(json!({
        "status": "success",
        "message": "Scaled deployment web in ns1 from 0 to 1 replicas.",
        "remediation_plan": {"action": "scale_target", "pod_name": "N/A"}
    }))
    .await;
    let cluster = Arc::new(InMemoryControlPlane::new().with_deployment("web", Some(0), 0));

    let plan = serde_json::from_value(json!({
        "action": "scale_deployment",
        "pod_name": null,
        "deployment_name": "web",
        "namespace": "ns1"
    }))
    .unwrap();
    executor(cluster.clone(), &reflection).run(plan).await;

    assert_eq!(cluster.desired("web"), Some(1));
    reflection.verify().await;
}

#[tokio::test]
async fn unreachable_verification_does_not_fail_execution() {
    let cluster = Arc::new(InMemoryControlPlane::new());
    let executor = Executor::new(
        cluster.clone(),
        HandoffClient::new("http://127.0.0.1:9/log", Duration::from_millis(200)),
    );

    let plan = serde_json::from_value(restart_plan()).unwrap();
    let result = executor.run(plan).await;

    assert!(result.is_success());
    assert_eq!(cluster.calls().len(), 1);
}

#[tokio::test]
async fn malformed_plan_is_rejected() {
    let reflection = MockServer::start().await;
    let app = build_router(Arc::new(ServerState {
        executor: Arc::new(executor(Arc::new(InMemoryControlPlane::new()), &reflection)),
    }));

    let response = app
        .oneshot(
            Request::post("/remediate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("[1, 2]"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
