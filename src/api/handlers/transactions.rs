use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::auth::UserId;
use crate::db::transaction_repo;
use crate::errors::AppError;
use crate::execution::ExecutionOutcome;
use crate::models::{OrderRequest, Transaction};
use crate::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// POST /api/transactions — execute a buy/sell order.
pub async fn create(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<ExecutionOutcome>), AppError> {
    let outcome = state.executor.execute(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/transactions — the user's history, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Json<ApiResponse<Vec<Transaction>>> {
    match transaction_repo::list_by_user(&state.db, user_id).await {
        Ok(transactions) => Json(ApiResponse {
            success: true,
            data: Some(transactions),
            error: None,
        }),
        Err(e) => Json(ApiResponse {
            success: false,
            data: None,
            error: Some(e.to_string()),
        }),
    }
}

/// GET /api/transactions/:id — one record, owner-checked.
pub async fn detail(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, AppError> {
    let transaction = transaction_repo::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

    if transaction.user_id != user_id {
        return Err(AppError::NotFound("Transaction not found".into()));
    }

    Ok(Json(transaction))
}
