use axum::{extract::State, Json};
use dvote_core::AppState;
use serde_json::{json, Value};

use crate::error::ApiError;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to DVote API" }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    dvote_db::ping(&state.db).await.map_err(|err| {
        tracing::warn!("health check failed: {err}");
        ApiError::ServiceUnavailable("database unreachable".into())
    })?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn metrics(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "votePolicy": state.votes.policy().to_string(),
        "votes": state.votes.metrics().snapshot(),
    }))
}
