use crate::error::CoreError;
use crate::retry::{with_retries, DEFAULT_MAX_ATTEMPTS};
use crate::validation;
use dvote_db::polls::{PollOptionRow, PollRow, PollSummaryRow};
use dvote_db::DbPool;
use dvote_models::{Poll, PollOption, PollSummary};

pub const DEFAULT_LIST_LIMIT: i64 = 25;
pub const MAX_LIST_LIMIT: i64 = 100;

fn poll_from_rows(poll: PollRow, options: Vec<PollOptionRow>) -> Poll {
    let options: Vec<PollOption> = options
        .into_iter()
        .map(|row| PollOption {
            id: row.id,
            text: row.text,
            votes: row.votes,
        })
        .collect();
    let total_votes = options.iter().map(|opt| opt.votes).sum();
    Poll {
        id: poll.id,
        question: poll.question,
        options,
        total_votes,
        created_at: poll.created_at,
    }
}

fn summary_from_row(row: PollSummaryRow) -> PollSummary {
    PollSummary {
        id: row.id,
        question: row.question,
        option_count: row.option_count,
        total_votes: row.total_votes,
        created_at: row.created_at,
    }
}

/// Create a poll with its options in one transaction.
pub async fn create_poll<S: AsRef<str>>(
    pool: &DbPool,
    question: &str,
    options: &[S],
) -> Result<Poll, CoreError> {
    let question = validation::normalize_question(question)?;
    let options = validation::normalize_options(options)?;

    let (question, options) = (question.as_str(), options.as_slice());
    let (poll, rows) = with_retries(DEFAULT_MAX_ATTEMPTS, None, move || {
        dvote_db::polls::create_poll(pool, question, options)
    })
    .await?;

    tracing::info!(poll_id = poll.id, options = rows.len(), "poll created");
    Ok(poll_from_rows(poll, rows))
}

pub async fn get_poll(pool: &DbPool, poll_id: i64) -> Result<Poll, CoreError> {
    let (poll, options) = dvote_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::PollNotFound { poll_id })?;
    Ok(poll_from_rows(poll, options))
}

/// Newest first. `limit` defaults to 25 and is clamped to 1..=100.
pub async fn list_polls(
    pool: &DbPool,
    limit: Option<i64>,
    before: Option<i64>,
) -> Result<Vec<PollSummary>, CoreError> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let rows = dvote_db::polls::list_polls(pool, limit, before).await?;
    Ok(rows.into_iter().map(summary_from_row).collect())
}
