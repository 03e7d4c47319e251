use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteRow {
    pub poll_id: i64,
    pub option_id: i64,
    pub voter_id: String,
    pub created_at: DateTime<Utc>,
}

/// What a vote transaction did. Only `Counted`, `Moved` and `Unchanged` commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote by this voter; `votes` is the option's count after the increment.
    Counted { votes: i64 },
    /// An earlier vote was moved off `from_option_id` onto the requested option.
    Moved { from_option_id: i64, votes: i64 },
    /// The voter already chose this option; nothing changed.
    Unchanged { votes: i64 },
    /// The voter already voted in this poll (for `option_id`); rolled back.
    AlreadyVoted { option_id: i64 },
    PollMissing,
    OptionMissing,
}

/// SQLite has no `SELECT ... FOR UPDATE`. A no-op update on the poll row takes the
/// database write lock before anything is read, so the checks below and the writes
/// that follow cannot interleave with another vote. Returns false if the poll is absent.
async fn lock_poll(conn: &mut SqliteConnection, poll_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE polls SET question = question WHERE id = ?1")
        .bind(poll_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

async fn option_in_poll(
    conn: &mut SqliteConnection,
    poll_id: i64,
    option_id: i64,
) -> Result<bool, DbError> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM poll_options WHERE id = ?1 AND poll_id = ?2")
            .bind(option_id)
            .bind(poll_id)
            .fetch_optional(conn)
            .await?;
    Ok(found.is_some())
}

async fn current_choice(
    conn: &mut SqliteConnection,
    poll_id: i64,
    voter_id: &str,
) -> Result<Option<i64>, DbError> {
    let option_id: Option<i64> =
        sqlx::query_scalar("SELECT option_id FROM votes WHERE poll_id = ?1 AND voter_id = ?2")
            .bind(poll_id)
            .bind(voter_id)
            .fetch_optional(conn)
            .await?;
    Ok(option_id)
}

async fn bump_option(
    conn: &mut SqliteConnection,
    poll_id: i64,
    option_id: i64,
    delta: i64,
) -> Result<i64, DbError> {
    let votes: Option<i64> = sqlx::query_scalar(
        "UPDATE poll_options SET votes = votes + ?3
         WHERE id = ?1 AND poll_id = ?2
         RETURNING votes",
    )
    .bind(option_id)
    .bind(poll_id)
    .bind(delta)
    .fetch_optional(conn)
    .await?;
    votes.ok_or(DbError::NotFound)
}

async fn option_votes(
    conn: &mut SqliteConnection,
    poll_id: i64,
    option_id: i64,
) -> Result<i64, DbError> {
    let votes: Option<i64> =
        sqlx::query_scalar("SELECT votes FROM poll_options WHERE id = ?1 AND poll_id = ?2")
            .bind(option_id)
            .bind(poll_id)
            .fetch_optional(conn)
            .await?;
    votes.ok_or(DbError::NotFound)
}

/// Lock the poll and run the referential checks shared by both vote paths.
/// On `Err(outcome)` the caller rolls back and reports the outcome.
async fn check_target(
    conn: &mut SqliteConnection,
    poll_id: i64,
    option_id: i64,
) -> Result<Result<(), VoteOutcome>, DbError> {
    if !lock_poll(&mut *conn, poll_id).await? {
        return Ok(Err(VoteOutcome::PollMissing));
    }
    if !option_in_poll(&mut *conn, poll_id, option_id).await? {
        return Ok(Err(VoteOutcome::OptionMissing));
    }
    Ok(Ok(()))
}

/// Record a first vote and count it. A voter who already voted in the poll gets
/// `AlreadyVoted` and no counter moves.
pub async fn insert_vote(
    pool: &DbPool,
    poll_id: i64,
    option_id: i64,
    voter_id: &str,
) -> Result<VoteOutcome, DbError> {
    let mut tx = pool.begin().await?;

    if let Err(outcome) = check_target(&mut *tx, poll_id, option_id).await? {
        tx.rollback().await?;
        return Ok(outcome);
    }
    if let Some(previous) = current_choice(&mut *tx, poll_id, voter_id).await? {
        tx.rollback().await?;
        return Ok(VoteOutcome::AlreadyVoted {
            option_id: previous,
        });
    }

    sqlx::query("INSERT INTO votes (poll_id, option_id, voter_id) VALUES (?1, ?2, ?3)")
        .bind(poll_id)
        .bind(option_id)
        .bind(voter_id)
        .execute(&mut *tx)
        .await?;
    let votes = bump_option(&mut *tx, poll_id, option_id, 1).await?;

    tx.commit().await?;
    Ok(VoteOutcome::Counted { votes })
}

/// Record a vote, moving the voter's earlier vote in the same poll if there is one.
/// The old option loses exactly the count the new option gains.
pub async fn upsert_vote(
    pool: &DbPool,
    poll_id: i64,
    option_id: i64,
    voter_id: &str,
) -> Result<VoteOutcome, DbError> {
    let mut tx = pool.begin().await?;

    if let Err(outcome) = check_target(&mut *tx, poll_id, option_id).await? {
        tx.rollback().await?;
        return Ok(outcome);
    }

    let outcome = match current_choice(&mut *tx, poll_id, voter_id).await? {
        None => {
            sqlx::query("INSERT INTO votes (poll_id, option_id, voter_id) VALUES (?1, ?2, ?3)")
                .bind(poll_id)
                .bind(option_id)
                .bind(voter_id)
                .execute(&mut *tx)
                .await?;
            let votes = bump_option(&mut *tx, poll_id, option_id, 1).await?;
            VoteOutcome::Counted { votes }
        }
        Some(previous) if previous == option_id => {
            let votes = option_votes(&mut *tx, poll_id, option_id).await?;
            tx.rollback().await?;
            return Ok(VoteOutcome::Unchanged { votes });
        }
        Some(previous) => {
            bump_option(&mut *tx, poll_id, previous, -1).await?;
            sqlx::query(
                "UPDATE votes SET option_id = ?3, created_at = CURRENT_TIMESTAMP
                 WHERE poll_id = ?1 AND voter_id = ?2",
            )
            .bind(poll_id)
            .bind(voter_id)
            .bind(option_id)
            .execute(&mut *tx)
            .await?;
            let votes = bump_option(&mut *tx, poll_id, option_id, 1).await?;
            VoteOutcome::Moved {
                from_option_id: previous,
                votes,
            }
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

pub async fn get_vote(
    pool: &DbPool,
    poll_id: i64,
    voter_id: &str,
) -> Result<Option<VoteRow>, DbError> {
    let row = sqlx::query_as::<_, VoteRow>(
        "SELECT poll_id, option_id, voter_id, created_at FROM votes
         WHERE poll_id = ?1 AND voter_id = ?2",
    )
    .bind(poll_id)
    .bind(voter_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn count_poll_votes(pool: &DbPool, poll_id: i64) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE poll_id = ?1")
        .bind(poll_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polls::{create_poll, get_poll};
    use crate::test_pool;

    async fn setup_poll(pool: &DbPool, question: &str) -> (i64, Vec<i64>) {
        let options = vec!["Red".to_string(), "Blue".to_string()];
        let (poll, rows) = create_poll(pool, question, &options).await.unwrap();
        (poll.id, rows.into_iter().map(|r| r.id).collect())
    }

    async fn counts(pool: &DbPool, poll_id: i64) -> Vec<i64> {
        let (_, options) = get_poll(pool, poll_id).await.unwrap().unwrap();
        options.into_iter().map(|o| o.votes).collect()
    }

    #[tokio::test]
    async fn test_insert_vote_counts_once() {
        let pool = test_pool().await;
        let (poll_id, options) = setup_poll(&pool, "Best color?").await;

        let first = insert_vote(&pool, poll_id, options[0], "u1").await.unwrap();
        assert_eq!(first, VoteOutcome::Counted { votes: 1 });

        let second = insert_vote(&pool, poll_id, options[1], "u1").await.unwrap();
        assert_eq!(
            second,
            VoteOutcome::AlreadyVoted {
                option_id: options[0]
            }
        );
        assert_eq!(counts(&pool, poll_id).await, [1, 0]);
        assert_eq!(count_poll_votes(&pool, poll_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_vote_missing_poll() {
        let pool = test_pool().await;
        let outcome = insert_vote(&pool, 7, 1, "u1").await.unwrap();
        assert_eq!(outcome, VoteOutcome::PollMissing);
    }

    #[tokio::test]
    async fn test_insert_vote_rejects_option_from_other_poll() {
        let pool = test_pool().await;
        let (first_poll, _) = setup_poll(&pool, "First?").await;
        let (second_poll, second_options) = setup_poll(&pool, "Second?").await;

        let outcome = insert_vote(&pool, first_poll, second_options[0], "u1")
            .await
            .unwrap();
        assert_eq!(outcome, VoteOutcome::OptionMissing);
        assert_eq!(counts(&pool, first_poll).await, [0, 0]);
        assert_eq!(counts(&pool, second_poll).await, [0, 0]);
        assert!(get_vote(&pool, first_poll, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_vote_moves_existing_vote() {
        let pool = test_pool().await;
        let (poll_id, options) = setup_poll(&pool, "Best color?").await;
        insert_vote(&pool, poll_id, options[0], "u2").await.unwrap();

        let first = upsert_vote(&pool, poll_id, options[0], "u1").await.unwrap();
        assert_eq!(first, VoteOutcome::Counted { votes: 2 });

        let moved = upsert_vote(&pool, poll_id, options[1], "u1").await.unwrap();
        assert_eq!(
            moved,
            VoteOutcome::Moved {
                from_option_id: options[0],
                votes: 1
            }
        );
        assert_eq!(counts(&pool, poll_id).await, [1, 1]);

        let vote = get_vote(&pool, poll_id, "u1").await.unwrap().unwrap();
        assert_eq!(vote.option_id, options[1]);
    }

    #[tokio::test]
    async fn test_upsert_same_option_is_unchanged() {
        let pool = test_pool().await;
        let (poll_id, options) = setup_poll(&pool, "Best color?").await;
        upsert_vote(&pool, poll_id, options[1], "u1").await.unwrap();
        let again = upsert_vote(&pool, poll_id, options[1], "u1").await.unwrap();
        assert_eq!(again, VoteOutcome::Unchanged { votes: 1 });
        assert_eq!(counts(&pool, poll_id).await, [0, 1]);
    }
}
