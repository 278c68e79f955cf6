use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gitwebhook_common::forwarder::ForwardError;
use gitwebhook_common::payload::DecodeError;
use gitwebhook_common::routing::ClassifyError;

pub const REQUEST_SENT_MESSAGE: &str = "Request sent successfully";

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ResponseStatus {
    OK,
    KO,
}

/// The envelope every `/service` response is wrapped in.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceResponse {
    pub status: ResponseStatus,
    pub statuscode: String,
    pub message: String,
}

impl ServiceResponse {
    pub fn ok() -> Self {
        Self {
            status: ResponseStatus::OK,
            statuscode: StatusCode::OK.as_u16().to_string(),
            message: REQUEST_SENT_MESSAGE.to_owned(),
        }
    }

    pub fn ko(message: String) -> Self {
        Self {
            status: ResponseStatus::KO,
            statuscode: StatusCode::INTERNAL_SERVER_ERROR.as_u16().to_string(),
            message,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct IsAliveResponse {
    pub name: String,
    pub version: String,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("WebhookHandler {0}")]
    DecodeError(#[from] DecodeError),
    #[error("{0}")]
    ClassifyError(#[from] ClassifyError),
    #[error("Request failed {0}")]
    ForwardError(#[from] ForwardError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ServiceResponse::ko(self.to_string())),
        )
            .into_response()
    }
}
