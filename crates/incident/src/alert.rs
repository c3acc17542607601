//! Alertmanager webhook payload.
//!
//! Reference: <https://prometheus.io/docs/alerting/latest/configuration/#webhook_config>

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status value of a batch (or alert) that should be acted upon.
pub const FIRING: &str = "firing";

/// Status value of an alert whose condition has cleared.
pub const RESOLVED: &str = "resolved";

/// A webhook notification: one or more alerts sharing a route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBatch {
    /// Version of the payload format
    #[serde(default)]
    pub version: String,
    /// Unique identifier for this group of alerts
    #[serde(default)]
    pub group_key: String,
    /// Status: "firing" or "resolved"
    pub status: String,
    /// Receiver that matched this alert
    #[serde(default)]
    pub receiver: String,
    /// Labels common to all alerts
    #[serde(default)]
    pub common_labels: HashMap<String, String>,
    /// Annotations common to all alerts
    #[serde(default)]
    pub common_annotations: HashMap<String, String>,
    /// External URL for Alertmanager
    #[serde(default)]
    pub external_url: String,
    /// Alerts in this notification
    #[serde(default)]
    pub alerts: Vec<AlertEvent>,
}

impl AlertBatch {
    /// Only firing batches enter the pipeline.
    #[must_use]
    pub fn is_firing(&self) -> bool {
        self.status == FIRING
    }

    /// Split the batch into independent alerts.
    ///
    /// Alerts that have already resolved are dropped. Common labels and
    /// annotations fill gaps in each remaining alert; values the alert carries
    /// itself always win.
    #[must_use]
    pub fn into_events(self) -> Vec<AlertEvent> {
        let Self {
            common_labels,
            common_annotations,
            alerts,
            ..
        } = self;

        alerts
            .into_iter()
            .filter(|alert| !alert.is_resolved())
            .map(|mut alert| {
                for (key, value) in &common_labels {
                    alert
                        .labels
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                for (key, value) in &common_annotations {
                    alert
                        .annotations
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                alert
            })
            .collect()
    }
}

/// A single firing condition. Immutable once received.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    /// Status: "firing" or "resolved"
    #[serde(default)]
    pub status: String,
    /// Alert labels
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Alert annotations
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// When the alert started firing
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// URL to the alert source
    #[serde(default)]
    pub generator_url: String,
    /// Unique fingerprint for this alert
    #[serde(default)]
    pub fingerprint: String,
}

impl AlertEvent {
    /// Look up a label, treating empty values as missing.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Get the alert name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.label("alertname").unwrap_or("Unknown Alert")
    }

    /// Get the namespace label.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.label("namespace")
    }

    /// Get the summary annotation.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.annotations
            .get("summary")
            .map_or("No summary.", String::as_str)
    }

    /// Whether this alert's own condition has cleared.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == RESOLVED
    }
}
