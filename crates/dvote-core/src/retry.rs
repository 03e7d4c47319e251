use crate::error::CoreError;
use crate::observability::VoteMetrics;
use dvote_db::DbError;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(25);

/// Run a store transaction, re-running it while the store reports lock contention.
/// Each attempt is a fresh transaction; a failed attempt has already rolled back.
pub async fn with_retries<T, F, Fut>(
    max_attempts: u32,
    metrics: Option<&VoteMetrics>,
    mut op: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_busy() && attempt < max_attempts => {
                tracing::warn!("store busy on attempt {attempt}/{max_attempts}, retrying: {err}");
                if let Some(metrics) = metrics {
                    metrics.retry();
                }
                tokio::time::sleep(BACKOFF_STEP * attempt).await;
                attempt += 1;
            }
            Err(err) if err.is_busy() => {
                tracing::warn!("store busy after {attempt} attempts, giving up: {err}");
                if let Some(metrics) = metrics {
                    metrics.exhausted();
                }
                return Err(CoreError::Transient { attempts: attempt });
            }
            Err(err) => return Err(CoreError::Database(err)),
        }
    }
}
