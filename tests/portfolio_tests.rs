mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use papertrade::db::{account_repo, snapshot_repo};
use papertrade::execution::{snapshotter, valuation, OrderExecutor};
use papertrade::marketdata::QuoteProvider;
use papertrade::models::{OrderKind, OrderRequest, Side};

use common::StaticQuotes;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn provider(quotes: &Arc<StaticQuotes>) -> Arc<dyn QuoteProvider> {
    quotes.clone()
}

async fn seed_position(
    pool: &sqlx::PgPool,
    quotes: &Arc<StaticQuotes>,
    user: Uuid,
    symbol: &str,
    quantity: i64,
    price: Decimal,
) {
    quotes.set_price(symbol, price);
    let executor = OrderExecutor::new(
        pool.clone(),
        provider(quotes),
        Decimal::from(100_000),
        3,
    );
    executor
        .execute(
            user,
            OrderRequest {
                side: Side::Buy,
                symbol: symbol.into(),
                company_name: None,
                quantity,
                order_kind: OrderKind::Market,
                limit_price: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_valuate_derives_market_value_and_pnl() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let user = Uuid::new_v4();

    seed_position(&pool, &quotes, user, "AAPL", 10, dec("150")).await;
    quotes.set_price("AAPL", dec("165"));

    let view = valuation::valuate(&pool, &provider(&quotes), user)
        .await
        .unwrap();

    assert_eq!(view.holdings.len(), 1);
    let h = &view.holdings[0];
    assert!(!h.stale);
    assert_eq!(h.current_price, dec("165"));
    assert_eq!(h.market_value, dec("1650"));
    assert_eq!(h.unrealized_pnl, dec("150"));
    assert_eq!(h.pnl_percent, dec("10"));
    assert_eq!(view.total_market_value, dec("1650"));
}

#[tokio::test]
async fn test_unpriced_symbol_keeps_cached_price_and_flags_stale() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let user = Uuid::new_v4();

    seed_position(&pool, &quotes, user, "AAPL", 4, dec("150")).await;
    seed_position(&pool, &quotes, user, "MSFT", 2, dec("300")).await;

    // The provider stops recognizing MSFT; its cached price (the
    // execution price) must be reused and flagged.
    quotes.remove_symbol("MSFT");
    quotes.set_price("AAPL", dec("160"));

    let view = valuation::valuate(&pool, &provider(&quotes), user)
        .await
        .unwrap();

    let aapl = view.holdings.iter().find(|h| h.symbol == "AAPL").unwrap();
    let msft = view.holdings.iter().find(|h| h.symbol == "MSFT").unwrap();

    assert!(!aapl.stale);
    assert_eq!(aapl.current_price, dec("160"));
    assert!(msft.stale);
    assert_eq!(msft.current_price, dec("300"));
    assert_eq!(view.total_market_value, dec("640") + dec("600"));
}

#[tokio::test]
async fn test_provider_outage_degrades_to_all_stale() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let user = Uuid::new_v4();

    seed_position(&pool, &quotes, user, "AAPL", 3, dec("150")).await;
    quotes.set_unavailable(true);

    let view = valuation::valuate(&pool, &provider(&quotes), user)
        .await
        .unwrap();

    assert_eq!(view.holdings.len(), 1);
    assert!(view.holdings[0].stale);
    assert_eq!(view.holdings[0].current_price, dec("150"));
}

#[tokio::test]
async fn test_snapshot_is_idempotent_per_day() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let user = Uuid::new_v4();

    seed_position(&pool, &quotes, user, "AAPL", 10, dec("150")).await;

    let account = account_repo::get(&pool, user).await.unwrap().unwrap();
    let view = valuation::valuate(&pool, &provider(&quotes), user)
        .await
        .unwrap();

    let first = snapshotter::snapshot_if_needed(&pool, user, &account, &view)
        .await
        .unwrap();
    let second = snapshotter::snapshot_if_needed(&pool, user, &account, &view)
        .await
        .unwrap();

    assert!(first.is_some());
    assert!(second.is_none());

    let snapshots = snapshot_repo::list_since(&pool, user, None).await.unwrap();
    assert_eq!(snapshots.len(), 1);

    let snap = &snapshots[0];
    assert_eq!(snap.holdings_value, dec("1500"));
    assert_eq!(snap.cash_balance, dec("98500"));
    assert_eq!(snap.total_value, dec("100000"));
    assert_eq!(snap.holdings.0.len(), 1);
    assert_eq!(snap.holdings.0[0].symbol, "AAPL");
    assert_eq!(snap.holdings.0[0].quantity, 10);
}

#[tokio::test]
async fn test_concurrent_snapshots_write_exactly_one_row() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let user = Uuid::new_v4();

    seed_position(&pool, &quotes, user, "AAPL", 1, dec("100")).await;

    let account = account_repo::get(&pool, user).await.unwrap().unwrap();
    let view = Arc::new(
        valuation::valuate(&pool, &provider(&quotes), user)
            .await
            .unwrap(),
    );

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let account = account.clone();
            let view = view.clone();
            tokio::spawn(async move {
                snapshotter::snapshot_if_needed(&pool, user, &account, &view).await
            })
        })
        .collect();

    let mut written = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().is_some() {
            written += 1;
        }
    }

    assert_eq!(written, 1);
    let snapshots = snapshot_repo::list_since(&pool, user, None).await.unwrap();
    assert_eq!(snapshots.len(), 1);
}
