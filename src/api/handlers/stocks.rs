use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::marketdata::types::SearchEnvelope;
use crate::marketdata::Quote;
use crate::AppState;

/// GET /api/stocks/quote/:symbol — one live quote through the shared
/// (cached) provider.
pub async fn quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Quote>, AppError> {
    let symbol = symbol.trim().to_uppercase();
    let quotes = state
        .quotes
        .get_quotes(std::slice::from_ref(&symbol))
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    quotes
        .get(&symbol)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Stock not found: {symbol}")))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
}

/// GET /api/stocks/search?query= — symbol search, proxied.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchEnvelope>, AppError> {
    if params.query.trim().is_empty() {
        return Err(AppError::BadRequest("Search query is required".into()));
    }

    let results = state
        .market
        .search(params.query.trim(), 10)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(results))
}

#[derive(Deserialize)]
pub struct ChartParams {
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_interval() -> String {
    "1d".into()
}

fn default_range() -> String {
    "1mo".into()
}

/// GET /api/stocks/chart/:symbol — OHLC series, proxied as-is.
pub async fn chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<ChartParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let data = state
        .market
        .chart(symbol.trim(), &params.interval, &params.range)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(Json(data))
}
