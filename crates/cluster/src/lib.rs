//! Control-plane operations against the managed cluster.
//!
//! The pipeline needs a small, fixed set of calls:
//!
//! - tail a pod's logs (diagnosis evidence)
//! - delete a pod (restart remediation)
//! - read and write a deployment's desired replicas (scale remediation)
//! - list pods by label selector and read deployment replica status (verification)
//!
//! [`ControlPlane`] is the seam the services are written against;
//! [`KubeControlPlane`] is the production implementation.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod kube_api;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use kube_api::KubeControlPlane;

/// Errors from control-plane calls.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The named object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Any other API failure
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Failure reported by a non-Kubernetes implementation
    #[error("{0}")]
    Other(String),
}

/// The fields of a pod verification looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSummary {
    pub name: String,
    /// Pod phase (Pending, Running, Succeeded, Failed, Unknown)
    pub phase: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Desired vs. ready replicas of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaStatus {
    /// `spec.replicas`; unset means the API default
    pub desired: Option<i32>,
    /// `status.readyReplicas`, zero when unset
    pub ready: i32,
}

/// Operations the pipeline performs against the managed system.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Last `lines` lines of a pod's log.
    async fn tail_pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        lines: i64,
    ) -> Result<String, ClusterError>;

    /// Delete a pod, leaving its controller to recreate it.
    async fn delete_pod(&self, namespace: &str, pod: &str) -> Result<(), ClusterError>;

    /// Pods matching a label selector.
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodSummary>, ClusterError>;

    /// Current desired replica count of a deployment (`None` when unset).
    async fn desired_replicas(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Option<i32>, ClusterError>;

    /// Write a deployment's desired replica count.
    async fn set_desired_replicas(
        &self,
        namespace: &str,
        deployment: &str,
        replicas: i32,
    ) -> Result<(), ClusterError>;

    /// Desired and ready replicas of a deployment.
    async fn replica_status(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<ReplicaStatus, ClusterError>;
}

/// The most recently created pod. Pods without a timestamp sort oldest.
#[must_use]
pub fn newest_pod(pods: &[PodSummary]) -> Option<&PodSummary> {
    pods.iter().max_by_key(|pod| pod.created_at)
}
