//! In-memory control plane that records every call.
//!
//! Enabled for tests and, through the `testing` feature, for the test suites
//! of dependent crates.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::{ClusterError, ControlPlane, PodSummary, ReplicaStatus};

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    TailLogs,
    DeletePod,
    ListPods,
    DesiredReplicas,
    SetDesiredReplicas,
    ReplicaStatus,
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    TailLogs { namespace: String, pod: String, lines: i64 },
    DeletePod { namespace: String, pod: String },
    ListPods { namespace: String, selector: String },
    DesiredReplicas { namespace: String, deployment: String },
    SetDesiredReplicas { namespace: String, deployment: String, replicas: i32 },
    ReplicaStatus { namespace: String, deployment: String },
}

#[derive(Default)]
struct State {
    logs: HashMap<String, String>,
    pod_listings: VecDeque<Vec<PodSummary>>,
    deployments: HashMap<String, (Option<i32>, i32)>,
    failures: HashMap<Operation, String>,
    calls: Vec<Call>,
}

/// Scriptable [`ControlPlane`]. Objects are keyed by name; namespaces are
/// recorded but not partitioned.
#[derive(Default)]
pub struct InMemoryControlPlane {
    state: Mutex<State>,
}

impl InMemoryControlPlane {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs returned for `pod`.
    #[must_use]
    pub fn with_logs(self, pod: &str, logs: &str) -> Self {
        self.lock().logs.insert(pod.to_string(), logs.to_string());
        self
    }

    /// Successive results of `list_pods`; the last listing repeats.
    #[must_use]
    pub fn with_pod_listings(self, listings: Vec<Vec<PodSummary>>) -> Self {
        self.lock().pod_listings = listings.into();
        self
    }

    /// A deployment with the given desired and ready replicas.
    #[must_use]
    pub fn with_deployment(self, name: &str, desired: Option<i32>, ready: i32) -> Self {
        self.lock()
            .deployments
            .insert(name.to_string(), (desired, ready));
        self
    }

    /// Make `operation` fail with `message`.
    #[must_use]
    pub fn failing(self, operation: Operation, message: &str) -> Self {
        self.lock().failures.insert(operation, message.to_string());
        self
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Desired replicas currently recorded for `deployment`.
    #[must_use]
    pub fn desired(&self, deployment: &str) -> Option<i32> {
        self.lock()
            .deployments
            .get(deployment)
            .and_then(|(desired, _)| *desired)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, call: Call, operation: Operation) -> Result<(), ClusterError> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.failures.get(&operation) {
            Some(message) => Err(ClusterError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

fn not_found(kind: &'static str, namespace: &str, name: &str) -> ClusterError {
    ClusterError::NotFound {
        kind,
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl ControlPlane for InMemoryControlPlane {
    async fn tail_pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        lines: i64,
    ) -> Result<String, ClusterError> {
        self.record(
            Call::TailLogs {
                namespace: namespace.to_string(),
                pod: pod.to_string(),
                lines,
            },
            Operation::TailLogs,
        )?;
        self.lock()
            .logs
            .get(pod)
            .cloned()
            .ok_or_else(|| not_found("pod", namespace, pod))
    }

    async fn delete_pod(&self, namespace: &str, pod: &str) -> Result<(), ClusterError> {
        self.record(
            Call::DeletePod {
                namespace: namespace.to_string(),
                pod: pod.to_string(),
            },
            Operation::DeletePod,
        )
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodSummary>, ClusterError> {
        self.record(
            Call::ListPods {
                namespace: namespace.to_string(),
                selector: label_selector.to_string(),
            },
            Operation::ListPods,
        )?;
        let mut state = self.lock();
        if state.pod_listings.len() > 1 {
            Ok(state.pod_listings.pop_front().unwrap_or_default())
        } else {
            Ok(state.pod_listings.front().cloned().unwrap_or_default())
        }
    }

    async fn desired_replicas(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Option<i32>, ClusterError> {
        self.record(
            Call::DesiredReplicas {
                namespace: namespace.to_string(),
                deployment: deployment.to_string(),
            },
            Operation::DesiredReplicas,
        )?;
        self.lock()
            .deployments
            .get(deployment)
            .map(|(desired, _)| *desired)
            .ok_or_else(|| not_found("deployment", namespace, deployment))
    }

    async fn set_desired_replicas(
        &self,
        namespace: &str,
        deployment: &str,
        replicas: i32,
    ) -> Result<(), ClusterError> {
        self.record(
            Call::SetDesiredReplicas {
                namespace: namespace.to_string(),
                deployment: deployment.to_string(),
                replicas,
            },
            Operation::SetDesiredReplicas,
        )?;
        let mut state = self.lock();
        let entry = state
            .deployments
            .get_mut(deployment)
            .ok_or_else(|| not_found("deployment", namespace, deployment))?;
        entry.0 = Some(replicas);
        Ok(())
    }

    async fn replica_status(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<ReplicaStatus, ClusterError> {
        self.record(
            Call::ReplicaStatus {
                namespace: namespace.to_string(),
                deployment: deployment.to_string(),
            },
            Operation::ReplicaStatus,
        )?;
        self.lock()
            .deployments
            .get(deployment)
            .map(|(desired, ready)| ReplicaStatus {
                desired: *desired,
                ready: *ready,
            })
            .ok_or_else(|| not_found("deployment", namespace, deployment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_and_injects_failures() {
        let cluster = InMemoryControlPlane::new()
            .with_deployment("web", None, 0)
            .failing(Operation::DeletePod, "forbidden");

        assert_eq!(cluster.desired_replicas("ns1", "web").await.unwrap(), None);
        cluster.set_desired_replicas("ns1", "web", 1).await.unwrap();
        assert_eq!(cluster.desired("web"), Some(1));

        let err = cluster.delete_pod("ns1", "web-7f").await.unwrap_err();
        assert_eq!(err.to_string(), "forbidden");
        assert_eq!(cluster.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_pod_listings_advance_then_repeat() {
        let pod = |name: &str| PodSummary {
            name: name.to_string(),
            phase: "Running".to_string(),
            created_at: None,
        };
        let cluster =
            InMemoryControlPlane::new().with_pod_listings(vec![vec![pod("a")], vec![pod("b")]]);

        assert_eq!(cluster.list_pods("ns", "app=web").await.unwrap()[0].name, "a");
        assert_eq!(cluster.list_pods("ns", "app=web").await.unwrap()[0].name, "b");
        assert_eq!(cluster.list_pods("ns", "app=web").await.unwrap()[0].name, "b");
    }
}
