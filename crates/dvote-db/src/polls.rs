use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub id: i64,
    pub question: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PollOptionRow {
    pub id: i64,
    pub poll_id: i64,
    pub position: i64,
    pub text: String,
    pub votes: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollSummaryRow {
    pub id: i64,
    pub question: String,
    pub option_count: i64,
    pub total_votes: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert a poll and all of its options in one transaction.
/// Options keep the order of the slice; nothing is visible until commit.
pub async fn create_poll(
    pool: &DbPool,
    question: &str,
    options: &[String],
) -> Result<(PollRow, Vec<PollOptionRow>), DbError> {
    if options.is_empty() {
        return Err(DbError::InvalidInput("a poll needs at least one option"));
    }

    let mut tx = pool.begin().await?;
    let poll = sqlx::query_as::<_, PollRow>(
        "INSERT INTO polls (question) VALUES (?1)
         RETURNING id, question, created_at",
    )
    .bind(question)
    .fetch_one(&mut *tx)
    .await?;

    let mut rows = Vec::with_capacity(options.len());
    for (position, text) in options.iter().enumerate() {
        let row = sqlx::query_as::<_, PollOptionRow>(
            "INSERT INTO poll_options (poll_id, position, text) VALUES (?1, ?2, ?3)
             RETURNING id, poll_id, position, text, votes",
        )
        .bind(poll.id)
        .bind(position as i64)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok((poll, rows))
}

/// Load a poll and its options from a single read snapshot.
pub async fn get_poll(
    pool: &DbPool,
    poll_id: i64,
) -> Result<Option<(PollRow, Vec<PollOptionRow>)>, DbError> {
    let mut tx = pool.begin().await?;
    let poll = sqlx::query_as::<_, PollRow>(
        "SELECT id, question, created_at FROM polls WHERE id = ?1",
    )
    .bind(poll_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(poll) = poll else {
        tx.rollback().await?;
        return Ok(None);
    };

    let options = sqlx::query_as::<_, PollOptionRow>(
        "SELECT id, poll_id, position, text, votes FROM poll_options
         WHERE poll_id = ?1
         ORDER BY position ASC",
    )
    .bind(poll_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some((poll, options)))
}

/// Newest polls first. `before` is an exclusive id cursor.
pub async fn list_polls(
    pool: &DbPool,
    limit: i64,
    before: Option<i64>,
) -> Result<Vec<PollSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, PollSummaryRow>(
        "SELECT p.id, p.question, p.created_at,
                COUNT(o.id) AS option_count,
                COALESCE(SUM(o.votes), 0) AS total_votes
         FROM polls p
         LEFT JOIN poll_options o ON o.poll_id = p.id
         WHERE ?1 IS NULL OR p.id < ?1
         GROUP BY p.id
         ORDER BY p.id DESC
         LIMIT ?2",
    )
    .bind(before)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;

    fn texts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_poll_keeps_option_order() {
        let pool = test_pool().await;
        let (poll, options) = create_poll(&pool, "Best color?", &texts(&["Red", "Blue", "Green"]))
            .await
            .unwrap();
        assert_eq!(poll.id, 1);
        assert_eq!(poll.question, "Best color?");
        let names: Vec<_> = options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(names, ["Red", "Blue", "Green"]);
        assert!(options.iter().all(|o| o.votes == 0 && o.poll_id == poll.id));
        assert_eq!(options[0].id, 1);
        assert_eq!(options[1].id, 2);
    }

    #[tokio::test]
    async fn test_create_poll_rejects_empty_option_list() {
        let pool = test_pool().await;
        let err = create_poll(&pool, "Empty?", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
        assert!(!err.is_busy());

        let polls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM polls")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(polls, 0);
    }

    #[tokio::test]
    async fn test_failed_option_insert_leaves_no_poll() {
        let pool = test_pool().await;
        // The duplicate violates UNIQUE (poll_id, text) after the poll row was written.
        let err = create_poll(&pool, "Dupes?", &texts(&["Yes", "Yes"]))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        let polls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM polls")
            .fetch_one(&pool)
            .await
            .unwrap();
        let options: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM poll_options")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(polls, 0);
        assert_eq!(options, 0);
    }

    #[tokio::test]
    async fn test_get_poll() {
        let pool = test_pool().await;
        let (created, _) = create_poll(&pool, "Tabs or spaces?", &texts(&["Tabs", "Spaces"]))
            .await
            .unwrap();
        let (poll, options) = get_poll(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(poll.question, "Tabs or spaces?");
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].position, 0);
        assert_eq!(options[1].text, "Spaces");
    }

    #[tokio::test]
    async fn test_get_poll_not_found() {
        let pool = test_pool().await;
        assert!(get_poll(&pool, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_polls_newest_first_with_cursor() {
        let pool = test_pool().await;
        for question in ["First?", "Second?", "Third?"] {
            create_poll(&pool, question, &texts(&["A", "B"])).await.unwrap();
        }
        sqlx::query("UPDATE poll_options SET votes = 2 WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();

        let page = list_polls(&pool, 2, None).await.unwrap();
        let ids: Vec<_> = page.iter().map(|p| p.id).collect();
        assert_eq!(ids, [3, 2]);
        assert!(page.iter().all(|p| p.option_count == 2));

        let rest = list_polls(&pool, 10, Some(2)).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].question, "First?");
        assert_eq!(rest[0].total_votes, 2);
    }
}
