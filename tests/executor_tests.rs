mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use papertrade::db::{account_repo, holding_repo, transaction_repo};
use papertrade::execution::{OrderExecutor, TradeError};
use papertrade::marketdata::QuoteProvider;
use papertrade::models::{OrderKind, OrderRequest, Side};

use common::StaticQuotes;

const STARTING_BALANCE: i64 = 100_000;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn build_executor(pool: sqlx::PgPool, quotes: Arc<StaticQuotes>) -> OrderExecutor {
    let provider: Arc<dyn QuoteProvider> = quotes;
    OrderExecutor::new(pool, provider, Decimal::from(STARTING_BALANCE), 3)
}

fn market(side: Side, symbol: &str, quantity: i64) -> OrderRequest {
    OrderRequest {
        side,
        symbol: symbol.into(),
        company_name: None,
        quantity,
        order_kind: OrderKind::Market,
        limit_price: None,
    }
}

fn limit(side: Side, symbol: &str, quantity: i64, limit_price: Decimal) -> OrderRequest {
    OrderRequest {
        side,
        symbol: symbol.into(),
        company_name: None,
        quantity,
        order_kind: OrderKind::Limit,
        limit_price: Some(limit_price),
    }
}

#[tokio::test]
async fn test_buy_sell_scenario_tracks_balance_and_basis() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    // BUY 10 AAPL @ 150 → balance 98500, qty 10, basis 150
    quotes.set_price("AAPL", dec("150"));
    let outcome = executor.execute(user, market(Side::Buy, "AAPL", 10)).await.unwrap();
    assert_eq!(outcome.account.cash_balance, dec("98500"));
    let holding = outcome.holding.unwrap();
    assert_eq!(holding.quantity, 10);
    assert_eq!(holding.average_cost, dec("150"));

    // BUY 5 AAPL @ 180 → basis (10*150+5*180)/15 = 160, balance 97600
    quotes.set_price("AAPL", dec("180"));
    let outcome = executor.execute(user, market(Side::Buy, "AAPL", 5)).await.unwrap();
    assert_eq!(outcome.account.cash_balance, dec("97600"));
    let holding = outcome.holding.unwrap();
    assert_eq!(holding.quantity, 15);
    assert_eq!(holding.average_cost, dec("160"));

    // SELL 15 AAPL @ 200 → balance 100600, holding deleted
    quotes.set_price("AAPL", dec("200"));
    let outcome = executor.execute(user, market(Side::Sell, "AAPL", 15)).await.unwrap();
    assert_eq!(outcome.account.cash_balance, dec("100600"));
    assert!(outcome.holding.is_none());

    let holdings = holding_repo::get_all(&pool, user).await.unwrap();
    assert!(holdings.is_empty());

    let transactions = transaction_repo::list_by_user(&pool, user).await.unwrap();
    assert_eq!(transactions.len(), 3);
    assert!(transactions.iter().all(|t| t.status == "COMPLETED"));
}

#[tokio::test]
async fn test_round_trip_nets_price_difference() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    quotes.set_price("MSFT", dec("310.25"));
    executor.execute(user, market(Side::Buy, "MSFT", 8)).await.unwrap();

    quotes.set_price("MSFT", dec("305.75"));
    let outcome = executor.execute(user, market(Side::Sell, "MSFT", 8)).await.unwrap();

    // Net change is (sell - buy) * qty = -4.50 * 8 = -36 relative to start.
    let expected = Decimal::from(STARTING_BALANCE) + (dec("305.75") - dec("310.25")) * dec("8");
    assert_eq!(outcome.account.cash_balance, expected);
    assert!(outcome.holding.is_none());
}

#[tokio::test]
async fn test_insufficient_funds_leaves_state_untouched() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    quotes.set_price("BRK-A", dec("600000"));
    let err = executor
        .execute(user, market(Side::Buy, "BRK-A", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::InsufficientFunds { .. }));

    // The failed order still provisioned the account; balance untouched.
    let account = account_repo::get(&pool, user).await.unwrap();
    if let Some(account) = account {
        assert_eq!(account.cash_balance, Decimal::from(STARTING_BALANCE));
    }
    assert!(holding_repo::get_all(&pool, user).await.unwrap().is_empty());
    assert_eq!(transaction_repo::count_by_user(&pool, user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_oversell_fails_and_preserves_holding() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    quotes.set_price("NVDA", dec("120"));
    executor.execute(user, market(Side::Buy, "NVDA", 5)).await.unwrap();

    let err = executor
        .execute(user, market(Side::Sell, "NVDA", 6))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TradeError::InsufficientShares {
            required: 6,
            available: 5
        }
    ));

    let account = account_repo::get(&pool, user).await.unwrap().unwrap();
    assert_eq!(
        account.cash_balance,
        Decimal::from(STARTING_BALANCE) - dec("600")
    );
    let holdings = holding_repo::get_all(&pool, user).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].quantity, 5);
    assert_eq!(transaction_repo::count_by_user(&pool, user).await.unwrap(), 1);
}

#[tokio::test]
async fn test_sell_without_holding_fails() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    quotes.set_price("TSLA", dec("250"));
    let err = executor
        .execute(user, market(Side::Sell, "TSLA", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::NoSuchHolding(_)));
    assert_eq!(transaction_repo::count_by_user(&pool, user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_symbol_fails() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    let err = executor
        .execute(user, market(Side::Buy, "ZZZZZZ", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::SymbolNotFound(_)));
}

#[tokio::test]
async fn test_provider_outage_fails_order() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    quotes.set_price("AAPL", dec("150"));
    quotes.set_unavailable(true);

    let err = executor
        .execute(user, market(Side::Buy, "AAPL", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::ProviderUnavailable(_)));
    assert_eq!(transaction_repo::count_by_user(&pool, user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_limit_buy_above_limit_rejects_without_transaction() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    quotes.set_price("AAPL", dec("105"));
    let err = executor
        .execute(user, limit(Side::Buy, "AAPL", 1, dec("100")))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::LimitNotMet { .. }));

    // Rejection writes nothing: no transaction, no account row even.
    assert_eq!(transaction_repo::count_by_user(&pool, user).await.unwrap(), 0);
    assert!(account_repo::get(&pool, user).await.unwrap().is_none());
}

#[tokio::test]
async fn test_limit_orders_execute_when_condition_met() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = build_executor(pool.clone(), quotes.clone());
    let user = Uuid::new_v4();

    // BUY executes when current <= limit
    quotes.set_price("AMD", dec("95"));
    let outcome = executor
        .execute(user, limit(Side::Buy, "AMD", 2, dec("100")))
        .await
        .unwrap();
    assert_eq!(outcome.transaction.order_kind, "LIMIT");
    assert_eq!(outcome.transaction.limit_price, Some(dec("100")));
    assert_eq!(outcome.transaction.price, dec("95"));

    // SELL rejects when current < limit, executes when current >= limit
    quotes.set_price("AMD", dec("98"));
    let err = executor
        .execute(user, limit(Side::Sell, "AMD", 2, dec("99")))
        .await
        .unwrap_err();
    assert!(matches!(err, TradeError::LimitNotMet { .. }));

    quotes.set_price("AMD", dec("99"));
    let outcome = executor
        .execute(user, limit(Side::Sell, "AMD", 2, dec("99")))
        .await
        .unwrap();
    assert_eq!(outcome.transaction.price, dec("99"));
    assert!(outcome.holding.is_none());
}

#[tokio::test]
async fn test_concurrent_orders_do_not_lose_updates() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = Arc::new(build_executor(pool.clone(), quotes.clone()));
    let user = Uuid::new_v4();

    quotes.set_price("AAPL", dec("100"));

    let tasks: Vec<_> = (0..25)
        .map(|_| {
            let executor = executor.clone();
            tokio::spawn(async move {
                executor.execute(user, market(Side::Buy, "AAPL", 1)).await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // 25 buys of 1 share @ 100 must all land: the final state equals a
    // sequential replay, with no interleaved balance reads lost.
    let account = account_repo::get(&pool, user).await.unwrap().unwrap();
    assert_eq!(
        account.cash_balance,
        Decimal::from(STARTING_BALANCE) - dec("2500")
    );

    let holdings = holding_repo::get_all(&pool, user).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].quantity, 25);
    assert_eq!(holdings[0].average_cost, dec("100"));

    assert_eq!(transaction_repo::count_by_user(&pool, user).await.unwrap(), 25);
}

#[tokio::test]
async fn test_concurrent_mixed_orders_keep_ledgers_consistent() {
    let pool = common::setup_test_db().await;
    let quotes = StaticQuotes::new();
    let executor = Arc::new(build_executor(pool.clone(), quotes.clone()));
    let user = Uuid::new_v4();

    quotes.set_price("MSFT", dec("200"));
    executor.execute(user, market(Side::Buy, "MSFT", 20)).await.unwrap();

    // 10 sells of 1 against 10 buys of 1, all at the same price.
    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let executor = executor.clone();
            let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
            tokio::spawn(async move { executor.execute(user, market(side, "MSFT", 1)).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Buys and sells cancel out exactly.
    let account = account_repo::get(&pool, user).await.unwrap().unwrap();
    assert_eq!(
        account.cash_balance,
        Decimal::from(STARTING_BALANCE) - dec("4000")
    );
    let holdings = holding_repo::get_all(&pool, user).await.unwrap();
    assert_eq!(holdings[0].quantity, 20);
    assert_eq!(transaction_repo::count_by_user(&pool, user).await.unwrap(), 21);
}
