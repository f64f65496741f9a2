use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_user;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no identity required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        // Market data proxies (read-only, user-independent)
        .route("/api/stocks/search", get(handlers::stocks::search))
        .route("/api/stocks/quote/:symbol", get(handlers::stocks::quote))
        .route("/api/stocks/chart/:symbol", get(handlers::stocks::chart));

    // Per-user routes — require the identity layer's X-User-Id assertion
    let protected = Router::new()
        // Trading
        .route(
            "/api/transactions",
            get(handlers::transactions::list).post(handlers::transactions::create),
        )
        .route("/api/transactions/:id", get(handlers::transactions::detail))
        // Portfolio
        .route("/api/portfolio", get(handlers::portfolio::get))
        .route("/api/portfolio/performance", get(handlers::portfolio::performance))
        .route("/api/portfolio/history", get(handlers::portfolio::history))
        // Watchlist
        .route("/api/watchlist", get(handlers::watchlist::get))
        .route("/api/watchlist/stocks", post(handlers::watchlist::add_stock))
        .route(
            "/api/watchlist/stocks/:symbol",
            delete(handlers::watchlist::remove_stock),
        )
        .layer(middleware::from_fn(require_user));

    // CORS: the SPA is served from another origin in development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
