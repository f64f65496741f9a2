use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for portfolio_snapshots table. At most one per user per
/// UTC calendar day; append-only, read back for history charting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PortfolioSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub snapshot_date: NaiveDate,
    pub holdings_value: Decimal,
    pub cash_balance: Decimal,
    pub total_value: Decimal,
    pub holdings: Json<Vec<SnapshotHolding>>,
    pub created_at: DateTime<Utc>,
}

/// Denormalized per-symbol line item frozen into a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHolding {
    pub symbol: String,
    pub company_name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub value: Decimal,
}
