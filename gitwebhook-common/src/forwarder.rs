use std::time;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::normalized::NormalizedEvent;

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("could not serialize event: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("request to {url} failed: {error}")]
    TransportError { url: String, error: reqwest::Error },
    #[error("event listener responded with status {0}")]
    StatusError(u16),
}

/// Delivers normalized events to event listeners.
#[async_trait]
pub trait EventForwarder {
    async fn forward(
        &self,
        destination: &str,
        event: &NormalizedEvent,
    ) -> Result<(), ForwardError>;
}

/// Forwards events with a single HTTP POST each.
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    pub fn new(
        request_timeout: time::Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent("gitwebhook-service")
            .timeout(request_timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl EventForwarder for HttpForwarder {
    async fn forward(
        &self,
        destination: &str,
        event: &NormalizedEvent,
    ) -> Result<(), ForwardError> {
        let body = event.to_json_pretty()?;
        debug!(
            "post data to event listener: {}",
            String::from_utf8_lossy(&body)
        );
        info!("forwarding event to {}", destination);

        let start = time::Instant::now();
        let response = self
            .client
            .post(destination)
            .body(body)
            .send()
            .await
            .map_err(|error| ForwardError::TransportError {
                url: destination.to_owned(),
                error,
            })?;

        metrics::histogram!("gitwebhook_forward_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        let status = response.status();
        if is_success_status(status) {
            debug!("response from event listener {}", status.as_u16());
            Ok(())
        } else {
            Err(ForwardError::StatusError(status.as_u16()))
        }
    }
}

/// Listeners acknowledge with anything up to 202 Accepted. Later 2xx codes are failures.
fn is_success_status(status: StatusCode) -> bool {
    status.as_u16() <= StatusCode::ACCEPTED.as_u16()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn event() -> NormalizedEvent {
        NormalizedEvent {
            repo_url: "https://github.com/acme/payments-api.git".to_owned(),
            repo_name: "payments-api".to_owned(),
            repo_hash: "9f3c2a1".to_owned(),
            actor_name: "octocat".to_owned(),
            actor_email: None,
            message: "Add refund endpoint".to_owned(),
            tag_version: None,
            infra_repo: None,
        }
    }

    fn forwarder() -> HttpForwarder {
        HttpForwarder::new(time::Duration::from_millis(5000), false)
            .expect("failed to build forwarder")
    }

    #[test]
    fn test_is_success_status() {
        assert!(is_success_status(StatusCode::OK));
        assert!(is_success_status(StatusCode::CREATED));
        assert!(is_success_status(StatusCode::ACCEPTED));
        assert!(!is_success_status(StatusCode::NON_AUTHORITATIVE_INFORMATION));
        assert!(!is_success_status(StatusCode::NO_CONTENT));
        assert!(!is_success_status(StatusCode::NOT_FOUND));
        assert!(!is_success_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_forward_posts_json() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/pr-merged")
                .header("content-type", "application/json")
                .json_body(serde_json::to_value(event()).unwrap());
            then.status(200).body("ok");
        });

        forwarder()
            .forward(&server.url("/pr-merged"), &event())
            .await
            .expect("forward failed");

        mock.assert();
    }

    #[tokio::test]
    async fn test_forward_accepted_is_success() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/202");
            then.status(202);
        });

        assert!(forwarder()
            .forward(&server.url("/202"), &event())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_forward_bad_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/203");
            then.status(203);
        });
        server.mock(|when, then| {
            when.method(POST).path("/500");
            then.status(500);
        });

        let err = forwarder()
            .forward(&server.url("/203"), &event())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::StatusError(203)));

        let err = forwarder()
            .forward(&server.url("/500"), &event())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::StatusError(500)));
    }

    #[tokio::test]
    async fn test_forward_transport_error() {
        // Nothing listens on port 1.
        let err = forwarder()
            .forward("http://127.0.0.1:1/unreachable", &event())
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::TransportError { .. }));
    }
}
