use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::auth::UserId;
use crate::db::watchlist_repo;
use crate::errors::AppError;
use crate::AppState;

#[derive(Serialize)]
pub struct WatchlistResponse {
    pub id: uuid::Uuid,
    pub name: String,
    pub stocks: Vec<WatchedStock>,
}

#[derive(Serialize)]
pub struct WatchedStock {
    pub symbol: String,
    pub company_name: String,
    pub added_at: DateTime<Utc>,
    pub current_price: Option<Decimal>,
}

/// GET /api/watchlist — the default watchlist with current prices merged
/// in. Prices are best-effort: an unavailable provider leaves them null.
pub async fn get(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Result<Json<WatchlistResponse>, AppError> {
    let watchlist = watchlist_repo::get_or_create_default(&state.db, user_id).await?;
    let entries = watchlist_repo::entries(&state.db, watchlist.id).await?;

    let symbols: Vec<String> = entries.iter().map(|e| e.symbol.clone()).collect();
    let price_map = match state.quotes.get_quotes(&symbols).await {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "Quote provider unavailable for watchlist prices");
            Default::default()
        }
    };

    let stocks = entries
        .into_iter()
        .map(|e| {
            let current_price = price_map.get(&e.symbol).map(|q| q.price);
            WatchedStock {
                symbol: e.symbol,
                company_name: e.company_name,
                added_at: e.added_at,
                current_price,
            }
        })
        .collect();

    Ok(Json(WatchlistResponse {
        id: watchlist.id,
        name: watchlist.name,
        stocks,
    }))
}

#[derive(Deserialize)]
pub struct AddStockRequest {
    pub symbol: String,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// POST /api/watchlist/stocks — add a symbol to the default list.
pub async fn add_stock(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Json(request): Json<AddStockRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let symbol = request.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::BadRequest("Symbol is required".into()));
    }

    // Resolve the display name (and implicitly that the symbol exists)
    // unless the caller supplied one.
    let company_name = match request.company_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            let quotes = state
                .quotes
                .get_quotes(std::slice::from_ref(&symbol))
                .await
                .map_err(|e| AppError::Upstream(e.to_string()))?;
            quotes
                .get(&symbol)
                .map(|q| q.company_name.clone())
                .ok_or_else(|| AppError::NotFound(format!("Stock not found: {symbol}")))?
        }
    };

    let watchlist = watchlist_repo::get_or_create_default(&state.db, user_id).await?;
    let entry = watchlist_repo::add_entry(&state.db, watchlist.id, &symbol, &company_name).await?;

    match entry {
        Some(entry) => Ok(Json(serde_json::json!({ "success": true, "entry": entry }))),
        None => Err(AppError::BadRequest(format!(
            "{symbol} is already on the watchlist"
        ))),
    }
}

/// DELETE /api/watchlist/stocks/:symbol — remove a symbol.
pub async fn remove_stock(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(symbol): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let symbol = symbol.trim().to_uppercase();
    let watchlist = watchlist_repo::get_or_create_default(&state.db, user_id).await?;

    if watchlist_repo::remove_entry(&state.db, watchlist.id, &symbol).await? {
        Ok(Json(serde_json::json!({ "success": true })))
    } else {
        Err(AppError::NotFound(format!(
            "{symbol} is not on the watchlist"
        )))
    }
}
