//! Fire-once HTTP hand-off to the next service in the pipeline.
//!
//! Hand-offs use a short fixed timeout and are never retried; callers log
//! the error and move on.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from a hand-off.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Connection, timeout, or serialization failure
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Downstream answered with a non-success status
    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },
}

/// Client bound to one downstream endpoint.
#[derive(Debug, Clone)]
pub struct HandoffClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HandoffClient {
    /// Create a client for `url` with a per-request timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout,
        }
    }

    /// Endpoint this client delivers to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` as JSON, once.
    pub async fn send<T: Serialize + ?Sized>(&self, body: &T) -> Result<StatusCode, HandoffError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|source| HandoffError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HandoffError::Status {
                url: self.url.clone(),
                status,
            });
        }

        debug!(url = %self.url, status = %status, "Hand-off delivered");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_delivers_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/remediate"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = HandoffClient::new(format!("{}/remediate", server.uri()), Duration::from_secs(5));
        let status = client.send(&serde_json::json!({"action": "no_action"})).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = HandoffClient::new(server.uri(), Duration::from_secs(5));
        let err = client.send(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, HandoffError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_timeout_is_a_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HandoffClient::new(server.uri(), Duration::from_millis(50));
        let err = client.send(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, HandoffError::Request { .. }));
    }
}
