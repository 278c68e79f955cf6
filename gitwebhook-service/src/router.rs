use std::future::ready;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use gitwebhook_common::metrics::{setup_metrics_recorder, track_metrics};

use crate::handlers::{self, AppState};

pub fn router(state: AppState, concurrency_limit: usize, metrics: bool) -> Router {
    let router = handlers::add_routes(Router::new(), state, concurrency_limit)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics));

    // Don't install metrics unless asked to
    // Installing a global recorder when the service is used as a library (during tests etc)
    // does not work well.
    if metrics {
        let recorder_handle = setup_metrics_recorder();

        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}
