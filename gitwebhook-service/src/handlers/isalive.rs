use axum::{extract::State, Json};

use super::app::AppState;
use crate::api::IsAliveResponse;

pub async fn get(State(state): State<AppState>) -> Json<IsAliveResponse> {
    Json(IsAliveResponse {
        name: state.name.clone(),
        version: state.version.clone(),
    })
}
