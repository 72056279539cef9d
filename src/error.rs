use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors raised by the recommendation engine
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecommenderError {
    /// Catalog or feature input cannot be used (empty catalog, bad sample size, malformed CSV)
    #[error("Data error: {0}")]
    Data(String),

    /// Query title or position is not part of the catalog
    #[error("No match: {0}")]
    Lookup(String),

    /// Catalog file or feature cache could not be opened, written or read back
    #[error("Storage error: {0}")]
    Storage(String),

    /// Feature matrix rows do not line up with the catalog
    #[error("Alignment error: {0}")]
    Alignment(String),
}

pub type RecommenderResult<T> = Result<T, RecommenderError>;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Recommender(#[from] RecommenderError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Recommender(ref err) => {
                let status = match err {
                    RecommenderError::Data(_) => StatusCode::BAD_REQUEST,
                    RecommenderError::Lookup(_) => StatusCode::NOT_FOUND,
                    RecommenderError::Alignment(_) => StatusCode::CONFLICT,
                    RecommenderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Request failed");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
