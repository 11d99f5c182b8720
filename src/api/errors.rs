use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{model::UnsupportedMetric, store::StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    /// Caller asked for a metric this service does not know. Caller bug,
    /// never silently defaulted.
    #[error(transparent)]
    UnsupportedMetric(#[from] UnsupportedMetric),

    #[error("unknown sensor: {0:?}")]
    UnknownSensor(String),

    #[error("unknown note: {0}")]
    UnknownNote(uuid::Uuid),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::UnsupportedMetric(_) | AppError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnknownSensor(_) | AppError::UnknownNote(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
