use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{OrderKind, Side};

/// Database row for transactions table. Immutable record of one executed
/// order; rejected limit orders are reported to the caller and never
/// recorded here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub side: String,
    pub symbol: String,
    pub company_name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub total_amount: Decimal,
    pub order_kind: String,
    pub limit_price: Option<Decimal>,
    pub status: String,
    pub executed_at: DateTime<Utc>,
}

/// An order as submitted by the caller, before price discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub side: Side,
    pub symbol: String,
    #[serde(default)]
    pub company_name: Option<String>,
    pub quantity: i64,
    #[serde(default)]
    pub order_kind: OrderKind,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
}
