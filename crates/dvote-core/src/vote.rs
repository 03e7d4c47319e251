use crate::error::CoreError;
use crate::observability::VoteMetrics;
use crate::retry::{with_retries, DEFAULT_MAX_ATTEMPTS};
use crate::validation;
use dvote_db::votes::VoteOutcome;
use dvote_db::DbPool;
use dvote_models::{VoteReceipt, VoteRecord};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What happens when a voter votes a second time in the same poll.
/// Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotePolicy {
    /// The second vote fails with a conflict and nothing changes.
    #[default]
    Reject,
    /// The earlier vote moves to the newly chosen option.
    Replace,
}

impl FromStr for VotePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(VotePolicy::Reject),
            "replace" => Ok(VotePolicy::Replace),
            other => Err(format!("unknown vote policy '{other}' (expected reject or replace)")),
        }
    }
}

impl fmt::Display for VotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VotePolicy::Reject => f.write_str("reject"),
            VotePolicy::Replace => f.write_str("replace"),
        }
    }
}

/// Validates and records votes. Holds no tally state: every count it returns
/// comes from the transaction that changed it.
#[derive(Clone, Debug)]
pub struct VoteEngine {
    policy: VotePolicy,
    max_attempts: u32,
    metrics: Arc<VoteMetrics>,
}

impl Default for VoteEngine {
    fn default() -> Self {
        Self::new(VotePolicy::default(), DEFAULT_MAX_ATTEMPTS)
    }
}

impl VoteEngine {
    pub fn new(policy: VotePolicy, max_attempts: u32) -> Self {
        Self {
            policy,
            max_attempts: max_attempts.max(1),
            metrics: Arc::new(VoteMetrics::default()),
        }
    }

    pub fn policy(&self) -> VotePolicy {
        self.policy
    }

    pub fn metrics(&self) -> &VoteMetrics {
        &self.metrics
    }

    /// Cast `voter_id`'s vote for `option_id` in `poll_id` and return the option's
    /// count after the change.
    pub async fn cast_vote(
        &self,
        pool: &DbPool,
        voter_id: &str,
        poll_id: i64,
        option_id: i64,
    ) -> Result<VoteReceipt, CoreError> {
        let voter_id = validation::normalize_voter_id(voter_id)?;
        let voter = voter_id.as_str();
        let policy = self.policy;

        let metrics = Some(self.metrics.as_ref());
        let outcome = with_retries(self.max_attempts, metrics, move || async move {
            match policy {
                VotePolicy::Reject => {
                    dvote_db::votes::insert_vote(pool, poll_id, option_id, voter).await
                }
                VotePolicy::Replace => {
                    dvote_db::votes::upsert_vote(pool, poll_id, option_id, voter).await
                }
            }
        })
        .await?;

        let votes = match outcome {
            VoteOutcome::Counted { votes } => {
                self.metrics.accepted();
                tracing::debug!(poll_id, option_id, votes, "vote counted");
                votes
            }
            VoteOutcome::Moved {
                from_option_id,
                votes,
            } => {
                self.metrics.replaced();
                tracing::debug!(poll_id, from_option_id, option_id, votes, "vote moved");
                votes
            }
            VoteOutcome::Unchanged { votes } => votes,
            VoteOutcome::AlreadyVoted { .. } => {
                self.metrics.duplicate();
                return Err(CoreError::Conflict { poll_id, voter_id });
            }
            VoteOutcome::PollMissing => {
                self.metrics.not_found();
                return Err(CoreError::PollNotFound { poll_id });
            }
            VoteOutcome::OptionMissing => {
                self.metrics.not_found();
                return Err(CoreError::OptionNotFound { poll_id, option_id });
            }
        };

        Ok(VoteReceipt {
            poll_id,
            option_id,
            votes,
        })
    }
}

/// The voter's current vote in a poll. `PollNotFound` if the poll is absent,
/// `Ok(None)` if the voter has not voted.
pub async fn get_vote(
    pool: &DbPool,
    poll_id: i64,
    voter_id: &str,
) -> Result<Option<VoteRecord>, CoreError> {
    let voter_id = validation::normalize_voter_id(voter_id)?;
    if dvote_db::polls::get_poll(pool, poll_id).await?.is_none() {
        return Err(CoreError::PollNotFound { poll_id });
    }
    let row = dvote_db::votes::get_vote(pool, poll_id, &voter_id).await?;
    Ok(row.map(|row| VoteRecord {
        poll_id: row.poll_id,
        option_id: row.option_id,
        voter_id: row.voter_id,
        created_at: row.created_at,
    }))
}
