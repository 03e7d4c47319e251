use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: i64,
    pub question: String,
    /// Options in creation order.
    pub options: Vec<PollOption>,
    pub total_votes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: i64,
    pub text: String,
    pub votes: i64,
}

/// Listing entry, without the option bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummary {
    pub id: i64,
    pub question: String,
    pub option_count: i64,
    pub total_votes: i64,
    pub created_at: DateTime<Utc>,
}
