use axum::{
    body::{self, Body},
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use tracing::{debug, info};

use gitwebhook_common::metrics::{report_event, EventOutcome};
use gitwebhook_common::payload::{parse_event, DecodeError};
use gitwebhook_common::routing::{classify, Route};

use super::app::AppState;
use crate::api::{ServiceError, ServiceResponse};

/// Receive one webhook delivery: decode it, classify it and forward the mapped event.
///
/// A delivery that matches no rule is acknowledged with the same envelope as a forwarded one.
pub async fn post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ServiceResponse>, ServiceError> {
    let provider = state.routing.provider;
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    let outcome = handle(&state, content_type, body).await;
    report_event(
        provider,
        match &outcome {
            Ok(outcome) => *outcome,
            Err(error) => outcome_of(error),
        },
    );

    outcome.map(|_| Json(ServiceResponse::ok()))
}

async fn handle(
    state: &AppState,
    content_type: Option<&str>,
    body: Body,
) -> Result<EventOutcome, ServiceError> {
    let body = body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|e| DecodeError::BodyRead(e.to_string()))?;
    debug!("received {} bytes ({:?})", body.len(), content_type);

    let event = parse_event(state.routing.provider, content_type, &body)?;

    match classify(&event, &state.routing)? {
        Route::Noop => Ok(EventOutcome::Noop),
        Route::Forward { event, destination } => {
            state.forwarder.forward(&destination, &event).await?;
            info!("event for {} sent to {}", event.repo_name, destination);
            Ok(EventOutcome::Forwarded)
        }
    }
}

fn outcome_of(error: &ServiceError) -> EventOutcome {
    match error {
        ServiceError::DecodeError(_) => EventOutcome::DecodeFailed,
        ServiceError::ClassifyError(_) => EventOutcome::Rejected,
        ServiceError::ForwardError(_) => EventOutcome::ForwardFailed,
    }
}
