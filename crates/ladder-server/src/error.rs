use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use ladder_engine::{ErrorCategory, LadderError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Ladder(#[from] LadderError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ladder(e) => match e.category() {
                ErrorCategory::Validation => StatusCode::BAD_REQUEST,
                ErrorCategory::NotFound => StatusCode::NOT_FOUND,
                ErrorCategory::Corruption | ErrorCategory::Io | ErrorCategory::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_types::TransactionId;

    #[test]
    fn engine_categories_map_to_status_codes() {
        let cases = [
            (LadderError::InvalidName, StatusCode::BAD_REQUEST),
            (
                LadderError::TransactionNotFound(TransactionId::new()),
                StatusCode::NOT_FOUND,
            ),
            (
                LadderError::Corruption("bad tail".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (LadderError::LockPoisoned, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status(), status);
        }
    }
}
