use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{account_repo, holding_repo, transaction_repo};
use crate::marketdata::{QuoteError, QuoteProvider};
use crate::models::{Account, Holding, OrderKind, OrderRequest, Side, Transaction};

use super::ledger::{self, PositionState};
use super::user_locks::UserLocks;

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("quote provider unavailable: {0}")]
    ProviderUnavailable(#[from] QuoteError),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("limit not met: current price {current} does not satisfy limit {limit}")]
    LimitNotMet { current: Decimal, limit: Decimal },

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("no shares of {0} held")]
    NoSuchHolding(String),

    #[error("insufficient shares: required {required}, available {available}")]
    InsufficientShares { required: i64, available: i64 },

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("order conflicted with a concurrent update, retries exhausted")]
    ConcurrentModification,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Everything that changed by one successful order.
#[derive(Debug, Serialize)]
pub struct ExecutionOutcome {
    pub transaction: Transaction,
    pub account: Account,
    /// None when a sell closed out the position.
    pub holding: Option<Holding>,
}

/// Executes buy/sell orders against live quotes and commits the cash
/// ledger, the holding, and the history row as one unit.
///
/// Atomicity comes from a single Postgres transaction; lost updates are
/// prevented by taking the account row `FOR UPDATE` (cross-process) and
/// by a per-user async lock (in-process), so balance checks and writes
/// can never interleave for one user. Serialization conflicts and
/// deadlocks are retried a bounded number of times.
pub struct OrderExecutor {
    pool: PgPool,
    quotes: Arc<dyn QuoteProvider>,
    locks: UserLocks,
    starting_balance: Decimal,
    max_retries: u32,
}

impl OrderExecutor {
    pub fn new(
        pool: PgPool,
        quotes: Arc<dyn QuoteProvider>,
        starting_balance: Decimal,
        max_retries: u32,
    ) -> Self {
        Self {
            pool,
            quotes,
            locks: UserLocks::new(),
            starting_balance,
            max_retries,
        }
    }

    /// Execute one order end to end:
    /// 1. validate the request
    /// 2. fetch the current price
    /// 3. gate limit orders against it (rejections write nothing)
    /// 4. apply the ledger mutation + history append atomically
    pub async fn execute(
        &self,
        user_id: Uuid,
        request: OrderRequest,
    ) -> Result<ExecutionOutcome, TradeError> {
        let symbol = validate(&request)?;

        // Serialize all orders for this user before any state is read.
        let _guard = self.locks.acquire(user_id).await;

        let quotes = self.quotes.get_quotes(std::slice::from_ref(&symbol)).await?;
        let quote = quotes
            .get(&symbol)
            .ok_or_else(|| TradeError::SymbolNotFound(symbol.clone()))?;
        let price = quote.price;

        if request.order_kind == OrderKind::Limit {
            // validate() guarantees limit_price is present for limit orders
            let limit = request.limit_price.unwrap_or_default();
            let rejected = match request.side {
                Side::Buy => price > limit,
                Side::Sell => price < limit,
            };
            if rejected {
                counter!("orders_rejected_total").increment(1);
                tracing::info!(
                    user_id = %user_id,
                    symbol = %symbol,
                    side = %request.side,
                    current = %price,
                    limit = %limit,
                    "Limit order rejected"
                );
                return Err(TradeError::LimitNotMet {
                    current: price,
                    limit,
                });
            }
        }

        let company_name = request
            .company_name
            .clone()
            .unwrap_or_else(|| quote.company_name.clone());
        let total_amount = Decimal::from(request.quantity) * price;

        let mut attempt = 0;
        loop {
            match self
                .commit_order(user_id, &request, &symbol, &company_name, price, total_amount)
                .await
            {
                Err(TradeError::Storage(e)) if is_retryable(&e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        counter!("orders_conflicted_total").increment(1);
                        return Err(TradeError::ConcurrentModification);
                    }
                    tracing::warn!(
                        user_id = %user_id,
                        symbol = %symbol,
                        attempt,
                        error = %e,
                        "Order transaction conflicted — retrying"
                    );
                }
                Ok(outcome) => {
                    counter!("orders_executed_total").increment(1);
                    tracing::info!(
                        user_id = %user_id,
                        symbol = %symbol,
                        side = %request.side,
                        quantity = request.quantity,
                        price = %price,
                        total = %total_amount,
                        "Order executed"
                    );
                    return Ok(outcome);
                }
                Err(e) => {
                    counter!("orders_rejected_total").increment(1);
                    return Err(e);
                }
            }
        }
    }

    /// One atomic attempt. Any error drops the transaction and rolls the
    /// whole order back — there is no partial state to clean up.
    async fn commit_order(
        &self,
        user_id: Uuid,
        request: &OrderRequest,
        symbol: &str,
        company_name: &str,
        price: Decimal,
        total_amount: Decimal,
    ) -> Result<ExecutionOutcome, TradeError> {
        let mut tx = self.pool.begin().await?;

        account_repo::ensure(&mut *tx, user_id, self.starting_balance).await?;
        let account = account_repo::lock(&mut *tx, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let (account, holding) = match request.side {
            Side::Buy => {
                if account.cash_balance < total_amount {
                    return Err(TradeError::InsufficientFunds {
                        required: total_amount,
                        available: account.cash_balance,
                    });
                }

                let existing = holding_repo::lock(&mut *tx, user_id, symbol).await?;
                let state = existing.as_ref().map(|h| PositionState {
                    quantity: h.quantity,
                    average_cost: h.average_cost,
                });
                let new_state = ledger::apply_buy(state.as_ref(), request.quantity, price);

                let holding = holding_repo::upsert(
                    &mut *tx,
                    user_id,
                    symbol,
                    company_name,
                    new_state.quantity,
                    new_state.average_cost,
                    price,
                )
                .await?;
                let account = account_repo::update_balance(
                    &mut *tx,
                    user_id,
                    account.cash_balance - total_amount,
                )
                .await?;

                (account, Some(holding))
            }
            Side::Sell => {
                let existing = holding_repo::lock(&mut *tx, user_id, symbol)
                    .await?
                    .ok_or_else(|| TradeError::NoSuchHolding(symbol.to_string()))?;

                if existing.quantity < request.quantity {
                    return Err(TradeError::InsufficientShares {
                        required: request.quantity,
                        available: existing.quantity,
                    });
                }

                let state = PositionState {
                    quantity: existing.quantity,
                    average_cost: existing.average_cost,
                };
                let outcome = ledger::apply_sell(&state, request.quantity, price);

                let holding = match outcome.remaining {
                    Some(remaining) => Some(
                        holding_repo::update_quantity(
                            &mut *tx,
                            existing.id,
                            remaining.quantity,
                            price,
                        )
                        .await?,
                    ),
                    None => {
                        holding_repo::delete(&mut *tx, existing.id).await?;
                        None
                    }
                };
                let account = account_repo::update_balance(
                    &mut *tx,
                    user_id,
                    account.cash_balance + total_amount,
                )
                .await?;

                (account, holding)
            }
        };

        let transaction = transaction_repo::insert(
            &mut *tx,
            user_id,
            request.side,
            symbol,
            company_name,
            request.quantity,
            price,
            total_amount,
            request.order_kind,
            // Recorded only for limit orders; a stray limit price on a
            // market order is not part of the executed order.
            (request.order_kind == OrderKind::Limit)
                .then_some(request.limit_price)
                .flatten(),
        )
        .await?;

        tx.commit().await?;

        Ok(ExecutionOutcome {
            transaction,
            account,
            holding,
        })
    }
}

fn validate(request: &OrderRequest) -> Result<String, TradeError> {
    let symbol = request.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(TradeError::InvalidOrder("symbol is required".into()));
    }
    if request.quantity <= 0 {
        return Err(TradeError::InvalidOrder(
            "quantity must be a positive integer".into(),
        ));
    }
    if request.order_kind == OrderKind::Limit {
        match request.limit_price {
            Some(limit) if limit > Decimal::ZERO => {}
            _ => {
                return Err(TradeError::InvalidOrder(
                    "limit orders require a positive limit price".into(),
                ));
            }
        }
    }

    Ok(symbol)
}

/// Conflicts worth an internal retry: Postgres serialization failure
/// (40001) and deadlock (40P01).
fn is_retryable(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(side: Side, quantity: i64, kind: OrderKind, limit: Option<Decimal>) -> OrderRequest {
        OrderRequest {
            side,
            symbol: "aapl".into(),
            company_name: None,
            quantity,
            order_kind: kind,
            limit_price: limit,
        }
    }

    #[test]
    fn test_validate_uppercases_symbol() {
        let symbol = validate(&request(Side::Buy, 1, OrderKind::Market, None)).unwrap();
        assert_eq!(symbol, "AAPL");
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        assert!(matches!(
            validate(&request(Side::Buy, 0, OrderKind::Market, None)),
            Err(TradeError::InvalidOrder(_))
        ));
        assert!(matches!(
            validate(&request(Side::Sell, -5, OrderKind::Market, None)),
            Err(TradeError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_validate_rejects_limit_without_price() {
        assert!(matches!(
            validate(&request(Side::Buy, 1, OrderKind::Limit, None)),
            Err(TradeError::InvalidOrder(_))
        ));
        assert!(matches!(
            validate(&request(Side::Buy, 1, OrderKind::Limit, Some(Decimal::ZERO))),
            Err(TradeError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_validate_accepts_limit_with_price() {
        let req = request(Side::Sell, 3, OrderKind::Limit, Some(Decimal::from(100)));
        assert_eq!(validate(&req).unwrap(), "AAPL");
    }
}
