use std::sync::Arc;

use papertrade::api::router::create_router;
use papertrade::config::AppConfig;
use papertrade::execution::OrderExecutor;
use papertrade::marketdata::{QuoteCache, QuoteProvider, YahooClient};
use papertrade::{db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected");

    let metrics_handle = papertrade::metrics::init_metrics();

    let market = YahooClient::new(config.quote_api_base.clone(), config.quote_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build quote client: {e}"))?;
    let quotes: Arc<dyn QuoteProvider> = Arc::new(QuoteCache::new(
        Arc::new(market.clone()),
        config.quote_cache_ttl_secs,
    ));

    let executor = Arc::new(OrderExecutor::new(
        pool.clone(),
        quotes.clone(),
        config.starting_balance,
        config.execute_max_retries,
    ));

    let state = AppState {
        db: pool,
        config,
        quotes,
        market,
        executor,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
