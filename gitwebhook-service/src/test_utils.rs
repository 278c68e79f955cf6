use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use gitwebhook_common::event::Provider;
use gitwebhook_common::forwarder::{EventForwarder, ForwardError};
use gitwebhook_common::normalized::NormalizedEvent;
use gitwebhook_common::routing::{Destinations, RoutingConfig};

use crate::config::{Config, EnvMsDuration};

pub const PR_OPENED_URL: &str = "http://listener.local/pr-opened";
pub const PR_MERGED_URL: &str = "http://listener.local/pr-merged";
pub const PRERELEASED_URL: &str = "http://listener.local/prerelease";
pub const RELEASED_URL: &str = "http://listener.local/release";

/// An `EventForwarder` that records what it is asked to send instead of sending it.
#[derive(Default)]
pub struct MockForwarder {
    calls: AtomicUsize,
    sent: Mutex<Vec<(String, NormalizedEvent)>>,
    fail_with_status: Option<u16>,
}

impl MockForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A forwarder whose every call fails as if the listener answered with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, NormalizedEvent)> {
        self.sent
            .lock()
            .expect("poisoned MockForwarder mutex")
            .clone()
    }
}

#[async_trait]
impl EventForwarder for MockForwarder {
    async fn forward(
        &self,
        destination: &str,
        event: &NormalizedEvent,
    ) -> Result<(), ForwardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self.fail_with_status {
            return Err(ForwardError::StatusError(status));
        }

        self.sent
            .lock()
            .expect("poisoned MockForwarder mutex")
            .push((destination.to_owned(), event.clone()));
        Ok(())
    }
}

pub fn lifecycle_routing(provider: Provider) -> RoutingConfig {
    RoutingConfig {
        provider,
        destinations: Destinations::Lifecycle {
            pr_opened: Some(PR_OPENED_URL.to_owned()),
            pr_merged: Some(PR_MERGED_URL.to_owned()),
            prereleased: Some(PRERELEASED_URL.to_owned()),
            released: Some(RELEASED_URL.to_owned()),
        },
        webhook_secret: None,
        infra_mapping: None,
    }
}

/// A valid configuration with no event listeners set; tests fill in what they need.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_owned(),
        port: 0,
        log_level: "info".to_owned(),
        name: "gitwebhook-service".to_owned(),
        version: "v0.0.1".to_owned(),
        provider: Provider::Github,
        pr_opened_url: None,
        pr_merged_url: None,
        prereleased_url: None,
        released_url: None,
        url_dev: None,
        url_uat: None,
        url_prod: None,
        webhook_secret: None,
        repo_mapping: None,
        request_timeout: EnvMsDuration(std::time::Duration::from_millis(5000)),
        tls_insecure_skip_verify: false,
        max_body_size: 1_000_000,
        concurrency_limit: 10,
        export_prometheus: false,
    }
}
