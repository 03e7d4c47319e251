use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of an accepted vote: the target option's count after the increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub poll_id: i64,
    pub option_id: i64,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub poll_id: i64,
    pub option_id: i64,
    pub voter_id: String,
    pub created_at: DateTime<Utc>,
}
