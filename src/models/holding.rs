use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for holdings table. One aggregated position per
/// (user, symbol); rows with quantity 0 are deleted, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub company_name: String,
    pub quantity: i64,
    pub average_cost: Decimal,
    /// Last price seen for this symbol; a display cache, refreshed
    /// best-effort on valuation. Never an input to order execution.
    pub last_price: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

/// A holding valuated against current (or cached) prices.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingView {
    pub symbol: String,
    pub company_name: String,
    pub quantity: i64,
    pub average_cost: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub pnl_percent: Decimal,
    /// True when the quote provider did not return a price for this
    /// symbol and `current_price` is the last cached value.
    pub stale: bool,
}

impl HoldingView {
    /// Build a view from a stored holding and a price, deriving market
    /// value and unrealized P&L.
    pub fn from_holding(holding: &Holding, price: Decimal, stale: bool) -> Self {
        let quantity = Decimal::from(holding.quantity);
        let market_value = quantity * price;
        let cost_basis = holding.average_cost * quantity;
        let unrealized_pnl = market_value - cost_basis;
        let pnl_percent = if cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            unrealized_pnl / cost_basis * Decimal::from(100)
        };

        Self {
            symbol: holding.symbol.clone(),
            company_name: holding.company_name.clone(),
            quantity: holding.quantity,
            average_cost: holding.average_cost,
            current_price: price,
            market_value,
            unrealized_pnl,
            pnl_percent,
            stale,
        }
    }
}
