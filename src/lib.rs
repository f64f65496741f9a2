pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod marketdata;
pub mod metrics;
pub mod models;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::execution::OrderExecutor;
use crate::marketdata::{QuoteProvider, YahooClient};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    /// Shared, short-TTL-cached quote source used by the executor,
    /// valuation, and the watchlist/quote endpoints.
    pub quotes: Arc<dyn QuoteProvider>,
    /// Direct client for the provider endpoints that bypass the quote
    /// contract (search, chart).
    pub market: YahooClient,
    pub executor: Arc<OrderExecutor>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
