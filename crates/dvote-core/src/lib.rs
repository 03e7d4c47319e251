pub mod error;
pub mod observability;
pub mod poll;
pub mod retry;
pub mod validation;
pub mod vote;

pub use error::CoreError;
pub use vote::{VoteEngine, VotePolicy};

use dvote_db::DbPool;

/// Settings fixed at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub vote_policy: VotePolicy,
    /// Attempts per vote transaction before contention surfaces as transient.
    pub max_vote_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vote_policy: VotePolicy::Reject,
            max_vote_attempts: retry::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub votes: VoteEngine,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        let votes = VoteEngine::new(config.vote_policy, config.max_vote_attempts);
        Self { db, config, votes }
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = dvote_db::create_pool("sqlite::memory:", 1)
        .await
        .expect("pool");
    dvote_db::run_migrations(&pool).await.expect("migrations");
    pool
}
