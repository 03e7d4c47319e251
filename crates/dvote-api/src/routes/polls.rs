use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use dvote_core::AppState;
use dvote_models::{Poll, PollSummary, VoteRecord};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Deserialize)]
pub struct ListPollsQuery {
    pub limit: Option<i64>,
    pub before: Option<i64>,
}

pub async fn create_poll(
    State(state): State<AppState>,
    body: Result<Json<CreatePollRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Poll>), ApiError> {
    let Json(body) = body?;
    let poll = dvote_core::poll::create_poll(&state.db, &body.question, &body.options).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

pub async fn list_polls(
    State(state): State<AppState>,
    query: Result<Query<ListPollsQuery>, QueryRejection>,
) -> Result<Json<Vec<PollSummary>>, ApiError> {
    let Query(query) = query?;
    let polls = dvote_core::poll::list_polls(&state.db, query.limit, query.before).await?;
    Ok(Json(polls))
}

pub async fn get_poll(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Poll>, ApiError> {
    let Path(poll_id) = path?;
    let poll = dvote_core::poll::get_poll(&state.db, poll_id).await?;
    Ok(Json(poll))
}

pub async fn get_voter_vote(
    State(state): State<AppState>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> Result<Json<VoteRecord>, ApiError> {
    let Path((poll_id, voter_id)) = path?;
    let vote = dvote_core::vote::get_vote(&state.db, poll_id, &voter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            message: format!("voter {voter_id} has not voted in poll {poll_id}"),
            details: serde_json::json!({ "pollId": poll_id, "voterId": voter_id }),
        })?;
    Ok(Json(vote))
}
