use std::convert::Infallible;
use std::sync::Arc;

use axum::{routing, Router};
use tower::limit::ConcurrencyLimitLayer;

use gitwebhook_common::forwarder::EventForwarder;
use gitwebhook_common::routing::RoutingConfig;

use super::{isalive, service};

#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<RoutingConfig>,
    pub forwarder: Arc<dyn EventForwarder + Send + Sync>,
    pub name: String,
    pub version: String,
    pub max_body_size: usize,
}

pub fn add_routes(router: Router, state: AppState, concurrency_limit: usize) -> Router {
    // Both API versions share one handler, and so one concurrency limit.
    let service = routing::post(service::post)
        .with_state(state.clone())
        .layer::<_, Infallible>(ConcurrencyLimitLayer::new(concurrency_limit));
    let isalive = routing::get(isalive::get).with_state(state);

    router
        .route("/", routing::get(index))
        .route("/_readiness", routing::get(index))
        .route("/_liveness", routing::get(index)) // No dependencies to check, just axum health
        .route("/api/v1/service", service.clone())
        .route("/api/v2/service", service)
        .route("/api/v1/isalive", isalive.clone())
        .route("/api/v2/sys/info/isalive", isalive)
}

pub async fn index() -> &'static str {
    "gitwebhook service"
}
