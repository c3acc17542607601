//! `kube`-backed control plane.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, DeleteParams, ListParams, LogParams, Patch, PatchParams},
    Client,
};
use serde_json::json;
use tracing::{debug, info};

use crate::{ClusterError, ControlPlane, PodSummary, ReplicaStatus};

/// Control plane talking to the Kubernetes API server.
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
}

impl KubeControlPlane {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// In-cluster config, falling back to the local kubeconfig.
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self { client })
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map a 404 onto [`ClusterError::NotFound`].
fn classify(err: kube::Error, kind: &'static str, namespace: &str, name: &str) -> ClusterError {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => ClusterError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => ClusterError::Api(other),
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn tail_pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        lines: i64,
    ) -> Result<String, ClusterError> {
        let params = LogParams {
            tail_lines: Some(lines),
            ..LogParams::default()
        };
        debug!(namespace, pod, lines, "Fetching pod logs");
        self.pods(namespace)
            .logs(pod, &params)
            .await
            .map_err(|e| classify(e, "pod", namespace, pod))
    }

    async fn delete_pod(&self, namespace: &str, pod: &str) -> Result<(), ClusterError> {
        self.pods(namespace)
            .delete(pod, &DeleteParams::default())
            .await
            .map_err(|e| classify(e, "pod", namespace, pod))?;
        info!(namespace, pod, "Deleted pod");
        Ok(())
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodSummary>, ClusterError> {
        let pods = self
            .pods(namespace)
            .list(&ListParams::default().labels(label_selector))
            .await?;

        Ok(pods
            .into_iter()
            .map(|pod| PodSummary {
                name: pod.metadata.name.unwrap_or_default(),
                phase: pod
                    .status
                    .and_then(|s| s.phase)
                    .unwrap_or_else(|| "Unknown".to_string()),
                created_at: pod.metadata.creation_timestamp.map(|t| t.0),
            })
            .collect())
    }

    async fn desired_replicas(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Option<i32>, ClusterError> {
        let scale = self
            .deployments(namespace)
            .get_scale(deployment)
            .await
            .map_err(|e| classify(e, "deployment", namespace, deployment))?;
        Ok(scale.spec.and_then(|spec| spec.replicas))
    }

    async fn set_desired_replicas(
        &self,
        namespace: &str,
        deployment: &str,
        replicas: i32,
    ) -> Result<(), ClusterError> {
        let patch = json!({ "spec": { "replicas": replicas } });
        self.deployments(namespace)
            .patch_scale(deployment, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| classify(e, "deployment", namespace, deployment))?;
        info!(namespace, deployment, replicas, "Patched deployment scale");
        Ok(())
    }

    async fn replica_status(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<ReplicaStatus, ClusterError> {
        let object = self
            .deployments(namespace)
            .get(deployment)
            .await
            .map_err(|e| classify(e, "deployment", namespace, deployment))?;

        Ok(ReplicaStatus {
            desired: object.spec.and_then(|spec| spec.replicas),
            ready: object
                .status
                .and_then(|status| status.ready_replicas)
                .unwrap_or(0),
        })
    }
}
