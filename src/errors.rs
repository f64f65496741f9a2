use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::execution::TradeError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

/// Business-rule outcomes map to client errors; only storage failures and
/// an unreachable provider are server-side.
impl From<TradeError> for AppError {
    fn from(e: TradeError) -> Self {
        match e {
            TradeError::ProviderUnavailable(_) => AppError::Upstream(e.to_string()),
            TradeError::SymbolNotFound(_) => AppError::NotFound(e.to_string()),
            TradeError::LimitNotMet { .. }
            | TradeError::InsufficientFunds { .. }
            | TradeError::InsufficientShares { .. }
            | TradeError::NoSuchHolding(_)
            | TradeError::InvalidOrder(_) => AppError::BadRequest(e.to_string()),
            TradeError::ConcurrentModification => AppError::Conflict(e.to_string()),
            TradeError::Storage(err) => AppError::Internal(err.into()),
        }
    }
}
