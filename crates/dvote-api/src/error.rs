use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dvote_core::CoreError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Machine-readable error code string.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::NotFound { details, .. } | ApiError::Conflict { details, .. } => {
                details.clone()
            }
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let details = self.details();

        let message = match &self {
            ApiError::Internal(err) => {
                tracing::error!("API internal error: {err:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "code": code,
            "message": message,
            "details": details,
        });

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let message = e.to_string();
        match e {
            CoreError::Validation(msg) => ApiError::Validation(msg),
            CoreError::PollNotFound { poll_id } => ApiError::NotFound {
                message,
                details: json!({ "pollId": poll_id }),
            },
            CoreError::OptionNotFound { poll_id, option_id } => ApiError::NotFound {
                message,
                details: json!({ "pollId": poll_id, "optionId": option_id }),
            },
            CoreError::Conflict { poll_id, voter_id } => ApiError::Conflict {
                message,
                details: json!({ "pollId": poll_id, "voterId": voter_id }),
            },
            CoreError::Transient { attempts } => ApiError::ServiceUnavailable(format!(
                "store busy after {attempts} attempts, try again"
            )),
            CoreError::Database(err) => ApiError::Internal(anyhow::anyhow!(err)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::Validation(err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Unmatched routes answer with the same JSON error body as handlers.
pub async fn route_not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound {
        message: format!("no route for {}", uri.path()),
        details: Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_statuses() {
        let not_found = ApiError::from(CoreError::OptionNotFound {
            poll_id: 1,
            option_id: 99,
        });
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.details()["optionId"], 99);

        let conflict = ApiError::from(CoreError::Conflict {
            poll_id: 1,
            voter_id: "u1".into(),
        });
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(conflict.error_code(), "CONFLICT");

        let busy = ApiError::from(CoreError::Transient { attempts: 3 });
        assert_eq!(busy.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let invalid = ApiError::from(CoreError::Validation("question must not be empty".into()));
        assert_eq!(invalid.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.to_string(), "question must not be empty");
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ApiError::from(CoreError::Database(dvote_db::DbError::NotFound));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal server error");
        assert_eq!(err.details(), Value::Null);
    }
}
