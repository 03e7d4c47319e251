use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use dvote_core::AppState;
use dvote_models::VoteReceipt;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub poll_id: i64,
    pub option_id: i64,
    pub voter_id: String,
}

pub async fn cast_vote(
    State(state): State<AppState>,
    body: Result<Json<CastVoteRequest>, JsonRejection>,
) -> Result<Json<VoteReceipt>, ApiError> {
    let Json(body) = body?;
    let receipt = state
        .votes
        .cast_vote(&state.db, &body.voter_id, body.poll_id, body.option_id)
        .await?;
    Ok(Json(receipt))
}
