use dvote_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("poll {poll_id} not found")]
    PollNotFound { poll_id: i64 },
    #[error("option {option_id} not found in poll {poll_id}")]
    OptionNotFound { poll_id: i64, option_id: i64 },
    #[error("voter {voter_id} already voted in poll {poll_id}")]
    Conflict { poll_id: i64, voter_id: String },
    #[error("store busy, gave up after {attempts} attempts")]
    Transient { attempts: u32 },
    #[error("database error: {0}")]
    Database(DbError),
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        if err.is_busy() {
            CoreError::Transient { attempts: 1 }
        } else if let DbError::InvalidInput(reason) = err {
            CoreError::Validation(reason.to_string())
        } else {
            CoreError::Database(err)
        }
    }
}
